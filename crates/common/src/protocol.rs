//! Request and response types exchanged with the cipher service.
//!
//! These types are serialised as JSON over the HTTP API.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Single-value endpoints
// ---------------------------------------------------------------------------

/// Request body for `POST /encrypt` and `POST /decrypt`.
///
/// A missing or `null` value is passed through unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValueRequest {
    #[serde(default)]
    pub value: Option<String>,
}

/// Response body for `POST /encrypt` and `POST /decrypt`.
///
/// On `/encrypt`, a `null` value for a non-empty input means the value could
/// not be protected and must not be persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValueResponse {
    pub value: Option<String>,
}

// ---------------------------------------------------------------------------
// Record endpoints
// ---------------------------------------------------------------------------

/// Request body for `POST /fields/encrypt` and `POST /fields/decrypt`.
///
/// The `payload` is an arbitrary JSON record; only its sensitive credential
/// fields are transformed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldsRequest {
    pub payload: serde_json::Value,
}

/// Response body for the record endpoints, mirroring the input structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldsResponse {
    pub payload: serde_json::Value,
}

// ---------------------------------------------------------------------------
// Key provisioning
// ---------------------------------------------------------------------------

/// Response body for `POST /keys`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedKeyResponse {
    /// 32 random bytes, hex-encoded (64 characters).
    pub key: String,
}

// ---------------------------------------------------------------------------
// Error response
// ---------------------------------------------------------------------------

/// Standard error response body returned on any non-2xx status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Short machine-readable error code (e.g. `"bad_request"`).
    pub code: String,
    /// Human-readable description safe to expose to callers.
    pub message: String,
}

impl ErrorResponse {
    /// Construct an [`ErrorResponse`] from a code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

impl From<&crate::ServiceError> for ErrorResponse {
    fn from(err: &crate::ServiceError) -> Self {
        Self::new(err.code(), err.to_string())
    }
}

// ---------------------------------------------------------------------------
// Health check
// ---------------------------------------------------------------------------

/// Response body for `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// `"ok"`, or `"degraded"` when running in plaintext pass-through mode.
    pub status: String,
    /// Whether an encryption key is configured.
    pub encryption_enabled: bool,
}
