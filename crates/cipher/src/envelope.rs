//! The stored ciphertext format.
//!
//! ```text
//! <hex(iv)>:<hex(auth_tag)>:<hex(ciphertext)>
//! ```
//!
//! This string replaces the plaintext value in the datastore, so its layout
//! must stay byte-compatible with records already written.

use std::{fmt, str::FromStr};

use crate::cipher::CipherError;

/// Byte length of the per-value initialization vector.
pub const IV_LEN: usize = 16;

/// Byte length of the GCM authentication tag.
pub const TAG_LEN: usize = 16;

/// Separator between the three hex segments.
pub const SEPARATOR: char = ':';

/// A parsed, encrypted value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    /// Random IV used for this value only.
    pub iv: [u8; IV_LEN],
    /// Detached authentication tag.
    pub auth_tag: [u8; TAG_LEN],
    /// Ciphertext without the tag.
    pub ciphertext: Vec<u8>,
}

impl Envelope {
    /// Returns `true` if `s` parses as an envelope.
    pub fn looks_like_envelope(s: &str) -> bool {
        s.parse::<Envelope>().is_ok()
    }
}

impl fmt::Display for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{SEPARATOR}{}{SEPARATOR}{}",
            hex::encode(self.iv),
            hex::encode(self.auth_tag),
            hex::encode(&self.ciphertext),
        )
    }
}

impl FromStr for Envelope {
    type Err = CipherError;

    /// Parse an envelope string.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::NotAnEnvelope`] unless `s` has exactly three
    /// non-empty hex segments and the IV and tag decode to 16 bytes each.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let [iv, auth_tag, ciphertext] = split_segments(s).ok_or(CipherError::NotAnEnvelope)?;
        if ciphertext.is_empty() {
            return Err(CipherError::NotAnEnvelope);
        }

        Ok(Self {
            iv: decode_fixed(iv)?,
            auth_tag: decode_fixed(auth_tag)?,
            ciphertext: hex::decode(ciphertext).map_err(|_| CipherError::NotAnEnvelope)?,
        })
    }
}

/// Split `s` into exactly three segments, or `None` for any other count.
pub(crate) fn split_segments(s: &str) -> Option<[&str; 3]> {
    let mut parts = s.split(SEPARATOR);
    let segments = [parts.next()?, parts.next()?, parts.next()?];
    if parts.next().is_some() {
        return None;
    }
    Some(segments)
}

fn decode_fixed<const N: usize>(segment: &str) -> Result<[u8; N], CipherError> {
    let mut out = [0u8; N];
    // `decode_to_slice` also rejects any length other than 2 * N.
    hex::decode_to_slice(segment, &mut out).map_err(|_| CipherError::NotAnEnvelope)?;
    Ok(out)
}
