//! AES-256-GCM encryption and decryption of individual credential strings.
//!
//! **Algorithm choice:** AES-256-GCM with a 128-bit random IV and a detached
//! 128-bit tag. The IV length is unusual for GCM (96 bits is the fast path)
//! but is fixed by the stored envelope format; the GHASH-derived counter
//! block handles it correctly.
//!
//! **Failure policy:** [`CredentialCipher::encrypt`] and
//! [`CredentialCipher::decrypt`] never return errors. Without a key they pass
//! values through, and a value that fails to decrypt is returned as stored.
//! Callers that need to tell those cases apart use the `try_` variants.

use aes_gcm::{
    aead::{
        consts::U16,
        generic_array::GenericArray,
        rand_core::RngCore,
        AeadInPlace, KeyInit, OsRng,
    },
    aes::Aes256,
    AesGcm,
};
use serde_json::Value;
use thiserror::Error;
use tracing::{error, warn};

use crate::envelope::{split_segments, Envelope, IV_LEN, TAG_LEN};
use crate::fields::{transform_record, SensitiveFieldSet};
use crate::key::{EncryptionKey, KeySecret};

/// AES-256-GCM parameterised for a 16-byte nonce.
type Aes256Gcm16 = AesGcm<Aes256, U16>;

/// Fills a fresh IV for one encryption.
type IvSource = fn(&mut [u8; IV_LEN]) -> Result<(), CipherError>;

/// Errors produced by the cipher layer.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CipherError {
    /// No key secret is configured; values are stored as plaintext.
    #[error("no encryption key configured")]
    KeyNotConfigured,

    /// The value is not in `iv:tag:ciphertext` form.
    #[error("value is not an encrypted envelope")]
    NotAnEnvelope,

    /// Empty values are never encrypted.
    #[error("refusing to encrypt an empty value")]
    EmptyPlaintext,

    /// The OS random number generator could not produce an IV.
    #[error("random IV generation failed")]
    RandomSource,

    /// AES-GCM encryption failed, or the tag did not verify on decryption
    /// (wrong key or tampered data).
    #[error("aead operation failed")]
    AeadFailure,

    /// The authenticated plaintext is not valid UTF-8.
    #[error("decrypted value is not valid UTF-8")]
    InvalidUtf8,
}

/// Configuration injected into [`CredentialCipher`] at construction.
#[derive(Debug, Clone, Default)]
pub struct CipherConfig {
    /// The key secret. `None` selects pass-through mode.
    pub key_secret: Option<KeySecret>,
}

impl CipherConfig {
    /// Build a configuration from an optional secret string; an empty string
    /// counts as unset.
    pub fn from_secret(secret: Option<impl Into<String>>) -> Self {
        Self {
            key_secret: secret.and_then(KeySecret::new),
        }
    }
}

/// Encrypts and decrypts credential strings and the credential fields of
/// JSON records.
///
/// Holds no mutable state: a single instance can be shared across any number
/// of concurrent request handlers.
#[derive(Clone)]
pub struct CredentialCipher {
    key: Option<EncryptionKey>,
    fields: SensitiveFieldSet,
    fill_iv: IvSource,
}

impl CredentialCipher {
    /// Create a cipher from `config`, deriving the key once.
    pub fn new(config: CipherConfig) -> Self {
        Self {
            key: config.key_secret.as_ref().map(EncryptionKey::derive),
            fields: SensitiveFieldSet::standard(),
            fill_iv: os_iv,
        }
    }

    /// A cipher in pass-through mode.
    pub fn disabled() -> Self {
        Self::new(CipherConfig::default())
    }

    /// Replace the set of fields the record operations act on.
    pub fn with_field_set(mut self, fields: SensitiveFieldSet) -> Self {
        self.fields = fields;
        self
    }

    /// Whether a key is configured. `false` means values are stored as plaintext.
    pub fn is_enabled(&self) -> bool {
        self.key.is_some()
    }

    /// The fields the record operations act on.
    pub fn field_set(&self) -> &SensitiveFieldSet {
        &self.fields
    }

    // -----------------------------------------------------------------------
    // Strict operations
    // -----------------------------------------------------------------------

    /// Encrypt `plaintext` into an envelope string.
    ///
    /// # Errors
    ///
    /// [`CipherError::KeyNotConfigured`] in pass-through mode,
    /// [`CipherError::EmptyPlaintext`] for `""`, and
    /// [`CipherError::RandomSource`] / [`CipherError::AeadFailure`] on an
    /// internal failure.
    pub fn try_encrypt(&self, plaintext: &str) -> Result<String, CipherError> {
        if plaintext.is_empty() {
            return Err(CipherError::EmptyPlaintext);
        }
        let key = self.key.as_ref().ok_or(CipherError::KeyNotConfigured)?;
        Ok(seal(key, plaintext.as_bytes(), self.fill_iv)?.to_string())
    }

    /// Decrypt an envelope string.
    ///
    /// # Errors
    ///
    /// [`CipherError::NotAnEnvelope`] when `data` is not in envelope form,
    /// [`CipherError::KeyNotConfigured`] in pass-through mode,
    /// [`CipherError::AeadFailure`] when the tag does not verify, and
    /// [`CipherError::InvalidUtf8`] if the plaintext is not UTF-8.
    pub fn try_decrypt(&self, data: &str) -> Result<String, CipherError> {
        // The segment count is checked before the key so that plain values
        // never trigger a missing-key warning.
        if split_segments(data).is_none() {
            return Err(CipherError::NotAnEnvelope);
        }
        let key = self.key.as_ref().ok_or(CipherError::KeyNotConfigured)?;
        let envelope: Envelope = data.parse()?;
        open(key, &envelope)
    }

    // -----------------------------------------------------------------------
    // Fail-open operations
    // -----------------------------------------------------------------------

    /// Encrypt `plaintext`.
    ///
    /// Returns `""` for `""` and the input unchanged in pass-through mode.
    /// Returns `None` only when encryption itself failed; such a value must
    /// not be persisted.
    pub fn encrypt(&self, plaintext: &str) -> Option<String> {
        match self.try_encrypt(plaintext) {
            Ok(envelope) => Some(envelope),
            Err(CipherError::EmptyPlaintext) => Some(String::new()),
            Err(CipherError::KeyNotConfigured) => {
                warn!("no encryption key configured; storing credential as plaintext");
                Some(plaintext.to_owned())
            }
            Err(e) => {
                error!(error = %e, "credential encryption failed");
                None
            }
        }
    }

    /// Decrypt `data`, returning it unchanged if it cannot be decrypted.
    ///
    /// A returned value equal to the input is ambiguous: it is either legacy
    /// plaintext or an envelope that failed to authenticate.
    pub fn decrypt(&self, data: &str) -> String {
        if data.is_empty() {
            return String::new();
        }
        match self.try_decrypt(data) {
            Ok(plaintext) => plaintext,
            Err(CipherError::NotAnEnvelope) => data.to_owned(),
            Err(CipherError::KeyNotConfigured) => {
                warn!("no encryption key configured; cannot decrypt stored credential");
                data.to_owned()
            }
            Err(e) => {
                warn!(error = %e, "credential decryption failed; returning stored value");
                data.to_owned()
            }
        }
    }

    // -----------------------------------------------------------------------
    // Record operations
    // -----------------------------------------------------------------------

    /// Return a copy of `record` with every non-empty sensitive string field
    /// encrypted. A field whose encryption fails becomes `null`.
    pub fn encrypt_object_fields(&self, record: &Value) -> Value {
        transform_record(record, &self.fields, &|value: &str| {
            self.encrypt(value).map_or(Value::Null, Value::String)
        })
    }

    /// Return a copy of `record` with every non-empty sensitive string field
    /// decrypted.
    pub fn decrypt_object_fields(&self, record: &Value) -> Value {
        transform_record(record, &self.fields, &|value: &str| {
            Value::String(self.decrypt(value))
        })
    }
}

impl std::fmt::Debug for CredentialCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialCipher")
            .field("enabled", &self.is_enabled())
            .field("fields", &self.fields)
            .finish()
    }
}

fn build_cipher(key: &EncryptionKey) -> Aes256Gcm16 {
    Aes256Gcm16::new(GenericArray::from_slice(key.as_bytes()))
}

fn os_iv(iv: &mut [u8; IV_LEN]) -> Result<(), CipherError> {
    OsRng
        .try_fill_bytes(iv)
        .map_err(|_| CipherError::RandomSource)
}

/// Encrypt `plaintext` under a fresh IV from `fill_iv`.
fn seal(
    key: &EncryptionKey,
    plaintext: &[u8],
    fill_iv: IvSource,
) -> Result<Envelope, CipherError> {
    let cipher = build_cipher(key);

    let mut iv = [0u8; IV_LEN];
    fill_iv(&mut iv)?;

    let mut buffer = plaintext.to_vec();
    let tag = cipher
        .encrypt_in_place_detached(GenericArray::from_slice(&iv), b"", &mut buffer)
        .map_err(|_| CipherError::AeadFailure)?;

    let mut auth_tag = [0u8; TAG_LEN];
    auth_tag.copy_from_slice(&tag);

    Ok(Envelope {
        iv,
        auth_tag,
        ciphertext: buffer,
    })
}

/// Verify and decrypt `envelope`.
fn open(key: &EncryptionKey, envelope: &Envelope) -> Result<String, CipherError> {
    let cipher = build_cipher(key);
    let mut buffer = envelope.ciphertext.clone();
    cipher
        .decrypt_in_place_detached(
            GenericArray::from_slice(&envelope.iv),
            b"",
            &mut buffer,
            GenericArray::from_slice(&envelope.auth_tag),
        )
        .map_err(|_| CipherError::AeadFailure)?;
    String::from_utf8(buffer).map_err(|_| CipherError::InvalidUtf8)
}
