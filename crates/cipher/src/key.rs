//! Key material: the configured secret and the 256-bit key derived from it.

use aes_gcm::aead::{rand_core::RngCore, OsRng};
use sha2::{Digest, Sha256};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Byte length of an AES-256 key (32 bytes = 256 bits).
pub const KEY_LEN: usize = 32;

/// Length of a secret that is taken verbatim as a hex-encoded key.
const HEX_KEY_LEN: usize = KEY_LEN * 2;

/// The raw key secret as supplied by the operator.
///
/// An empty secret is never constructed; [`KeySecret::new`] maps it to `None`
/// so that it behaves exactly like an unset one.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct KeySecret(String);

impl KeySecret {
    /// Wrap a configured secret, returning `None` when it is empty.
    pub fn new(secret: impl Into<String>) -> Option<Self> {
        let secret = secret.into();
        if secret.is_empty() {
            None
        } else {
            Some(Self(secret))
        }
    }

    /// Borrow the secret string.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for KeySecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("KeySecret([REDACTED])")
    }
}

/// A 32-byte symmetric key. Zeroed on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct EncryptionKey([u8; KEY_LEN]);

impl EncryptionKey {
    /// Derive the key for `secret`.
    ///
    /// A secret of exactly 64 hex characters is decoded as the key itself.
    /// Any other secret is hashed with SHA-256.
    pub fn derive(secret: &KeySecret) -> Self {
        let raw = secret.expose();
        if raw.len() == HEX_KEY_LEN && raw.bytes().all(|b| b.is_ascii_hexdigit()) {
            let mut bytes = [0u8; KEY_LEN];
            if hex::decode_to_slice(raw, &mut bytes).is_ok() {
                return Self(bytes);
            }
        }

        let digest = Sha256::digest(raw.as_bytes());
        let mut bytes = [0u8; KEY_LEN];
        bytes.copy_from_slice(&digest);
        Self(bytes)
    }

    /// Borrow the raw key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl std::fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print key material, not even in debug builds.
        f.write_str("EncryptionKey([REDACTED])")
    }
}

/// Generate a fresh random key, hex-encoded (64 characters).
///
/// Intended for operator-driven provisioning of `ENCRYPTION_KEY`; the result
/// is accepted verbatim by [`EncryptionKey::derive`].
pub fn generate_key() -> String {
    let mut key = [0u8; KEY_LEN];
    OsRng.fill_bytes(&mut key);
    let encoded = hex::encode(key);
    key.zeroize();
    encoded
}
