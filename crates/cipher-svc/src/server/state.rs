//! Shared application state injected into every Axum handler.

use std::sync::Arc;

use credential_cipher::CredentialCipher;

/// Application state shared across all request handlers.
///
/// Cloned per request; the cipher sits behind an `Arc` so key material is
/// never copied.
#[derive(Clone, Debug)]
pub struct AppState {
    /// The configured credential cipher (possibly in pass-through mode).
    pub cipher: Arc<CredentialCipher>,
    /// Whether `/decrypt` reports failures instead of echoing the input.
    pub strict_decrypt: bool,
}

impl AppState {
    /// Create a new [`AppState`] around `cipher`.
    pub fn new(cipher: CredentialCipher, strict_decrypt: bool) -> Self {
        Self {
            cipher: Arc::new(cipher),
            strict_decrypt,
        }
    }
}

impl Default for AppState {
    /// A pass-through, fail-open state, suitable for tests.
    fn default() -> Self {
        Self::new(CredentialCipher::disabled(), false)
    }
}
