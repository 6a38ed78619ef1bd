//! Axum request handlers for all service endpoints.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use common::protocol::{
    ErrorResponse, FieldsRequest, FieldsResponse, GeneratedKeyResponse, HealthResponse,
    ValueRequest, ValueResponse,
};
use common::ServiceError;
use credential_cipher::generate_key;
use tracing::{debug, info, warn};

use super::extract::{ApiError, AppJson};
use super::state::AppState;

/// `POST /encrypt` — encrypt a single credential value.
///
/// A `null` or empty value is echoed back. A `null` result for a non-empty
/// value means encryption failed and the value must not be stored.
pub async fn encrypt(
    State(state): State<AppState>,
    AppJson(req): AppJson<ValueRequest>,
) -> Response {
    let value = match req.value {
        Some(v) if !v.is_empty() => v,
        other => return ok(ValueResponse { value: other }),
    };

    let encrypted = state.cipher.encrypt(&value);
    if encrypted.is_none() {
        warn!(len = value.len(), "encrypt returned no value");
    }
    ok(ValueResponse { value: encrypted })
}

/// `POST /decrypt` — decrypt a single stored value.
///
/// In the default fail-open mode, values that are not envelopes or fail to
/// authenticate are returned unchanged. In strict mode they produce a `422`.
pub async fn decrypt(
    State(state): State<AppState>,
    AppJson(req): AppJson<ValueRequest>,
) -> Response {
    let value = match req.value {
        Some(v) if !v.is_empty() => v,
        other => return ok(ValueResponse { value: other }),
    };

    if !state.strict_decrypt {
        return ok(ValueResponse {
            value: Some(state.cipher.decrypt(&value)),
        });
    }

    match state.cipher.try_decrypt(&value) {
        Ok(plaintext) => ok(ValueResponse {
            value: Some(plaintext),
        }),
        Err(e) => {
            debug!(error = %e, "strict decrypt rejected value");
            error_response(ServiceError::DecryptionFailure(e.to_string()))
        }
    }
}

/// `POST /fields/encrypt` — encrypt the credential fields of a record.
pub async fn encrypt_fields(
    State(state): State<AppState>,
    AppJson(req): AppJson<FieldsRequest>,
) -> Response {
    let payload = state.cipher.encrypt_object_fields(&req.payload);
    ok(FieldsResponse { payload })
}

/// `POST /fields/decrypt` — decrypt the credential fields of a record.
///
/// Always fail-open: fields that cannot be decrypted keep their stored value.
pub async fn decrypt_fields(
    State(state): State<AppState>,
    AppJson(req): AppJson<FieldsRequest>,
) -> Response {
    let payload = state.cipher.decrypt_object_fields(&req.payload);
    ok(FieldsResponse { payload })
}

/// `POST /keys` — generate a fresh key for operator provisioning.
///
/// The key is not installed; it is only returned to the caller.
pub async fn generate() -> Response {
    info!("generated new encryption key");
    ok(GeneratedKeyResponse { key: generate_key() })
}

/// `GET /health` — liveness check that also reports pass-through mode.
///
/// Always `200 OK`; `status` is `"degraded"` when no key is configured.
pub async fn health(State(state): State<AppState>) -> Response {
    let encryption_enabled = state.cipher.is_enabled();
    let status = if encryption_enabled { "ok" } else { "degraded" };
    ok(HealthResponse {
        status: status.into(),
        encryption_enabled,
    })
}

/// Catch-all 404 handler.
pub async fn not_found() -> impl IntoResponse {
    let err = ErrorResponse::new("not_found", "the requested resource does not exist");
    (StatusCode::NOT_FOUND, Json(err))
}

fn ok<T: serde::Serialize>(body: T) -> Response {
    (StatusCode::OK, Json(body)).into_response()
}

fn error_response(err: ServiceError) -> Response {
    ApiError(err).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::Request,
        routing::{get, post},
        Router,
    };
    use credential_cipher::{CipherConfig, CredentialCipher, Envelope};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn keyed_state(strict: bool) -> AppState {
        let cipher = CredentialCipher::new(CipherConfig::from_secret(Some("handler-test-secret")));
        AppState::new(cipher, strict)
    }

    fn test_router(state: AppState) -> Router {
        Router::new()
            .route("/encrypt", post(encrypt))
            .route("/decrypt", post(decrypt))
            .route("/fields/encrypt", post(encrypt_fields))
            .route("/fields/decrypt", post(decrypt_fields))
            .route("/keys", post(generate))
            .route("/health", get(health))
            .with_state(state)
    }

    async fn call(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
        let req = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn health_reports_degraded_without_key() {
        let app = test_router(AppState::default());
        let req = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, json!({"status": "degraded", "encryption_enabled": false}));
    }

    #[tokio::test]
    async fn encrypt_then_decrypt() {
        let state = keyed_state(false);
        let (status, body) =
            call(test_router(state.clone()), "/encrypt", json!({"value": "sk_live_1"})).await;
        assert_eq!(status, StatusCode::OK);
        let envelope = body["value"].as_str().unwrap().to_owned();
        assert!(Envelope::looks_like_envelope(&envelope));

        let (status, body) =
            call(test_router(state), "/decrypt", json!({"value": envelope})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["value"], "sk_live_1");
    }

    #[tokio::test]
    async fn null_and_empty_values_echo() {
        let (_, body) = call(test_router(keyed_state(false)), "/encrypt", json!({})).await;
        assert_eq!(body, json!({"value": null}));
        let (_, body) =
            call(test_router(keyed_state(true)), "/decrypt", json!({"value": ""})).await;
        assert_eq!(body, json!({"value": ""}));
    }

    #[tokio::test]
    async fn fail_open_decrypt_returns_plaintext_unchanged() {
        let (status, body) = call(
            test_router(keyed_state(false)),
            "/decrypt",
            json!({"value": "legacy-token"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["value"], "legacy-token");
    }

    #[tokio::test]
    async fn strict_decrypt_rejects_plaintext() {
        let (status, body) = call(
            test_router(keyed_state(true)),
            "/decrypt",
            json!({"value": "legacy-token"}),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["code"], "decryption_failed");
    }

    #[tokio::test]
    async fn fields_round_trip() {
        let state = keyed_state(false);
        let record = json!({"client_secret": "abc", "other": "x"});
        let (_, body) = call(
            test_router(state.clone()),
            "/fields/encrypt",
            json!({"payload": record}),
        )
        .await;
        assert_eq!(body["payload"]["other"], "x");
        assert_ne!(body["payload"]["client_secret"], "abc");

        let (_, body) = call(test_router(state), "/fields/decrypt", body).await;
        assert_eq!(body["payload"], record);
    }

    #[tokio::test]
    async fn generate_returns_hex_key() {
        let (status, body) = call(test_router(AppState::default()), "/keys", json!({})).await;
        assert_eq!(status, StatusCode::OK);
        let key = body["key"].as_str().unwrap();
        assert_eq!(key.len(), 64);
        assert!(key.bytes().all(|b| b.is_ascii_hexdigit()));
    }

    #[tokio::test]
    async fn wrong_body_shape_is_a_json_bad_request() {
        let (status, body) =
            call(test_router(keyed_state(false)), "/fields/encrypt", json!({})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "bad_request");

        let (status, body) = call(
            test_router(keyed_state(false)),
            "/encrypt",
            json!({"value": 42}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "bad_request");
    }

    #[tokio::test]
    async fn pass_through_encrypt_echoes_value() {
        let (_, body) = call(
            test_router(AppState::default()),
            "/encrypt",
            json!({"value": "plain"}),
        )
        .await;
        assert_eq!(body["value"], "plain");
    }
}
