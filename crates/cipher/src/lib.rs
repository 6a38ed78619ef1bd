//! At-rest protection for stored credentials (OAuth tokens, API keys, client secrets).
//!
//! This crate is intentionally free of I/O, async, and environment access:
//! the key secret is handed to [`CredentialCipher::new`] by the caller.
//!
//! # Ciphertext format
//!
//! ```text
//! <hex(iv: 16 bytes)>:<hex(gcm tag: 16 bytes)>:<hex(ciphertext)>
//! ```
//!
//! Values not in this form are treated as legacy plaintext and returned
//! unchanged by [`CredentialCipher::decrypt`].
//!
//! # Key derivation
//!
//! A secret of exactly 64 hex characters is used directly as the 32-byte key;
//! anything else is hashed with SHA-256. No secret means pass-through mode,
//! in which both directions are the identity.

pub mod cipher;
pub mod envelope;
pub mod fields;
pub mod key;

pub use cipher::{CipherConfig, CipherError, CredentialCipher};
pub use envelope::Envelope;
pub use fields::SensitiveFieldSet;
pub use key::{generate_key, EncryptionKey, KeySecret, KEY_LEN};
