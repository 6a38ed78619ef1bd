//! `cipher-svc` — credential cipher HTTP service entry point.
//!
//! Startup sequence:
//! 1. Load and validate [`Config`] from environment variables.
//! 2. Initialise the telemetry pipeline (JSON logs, optional OTLP spans).
//! 3. Build the [`CredentialCipher`] from the injected key secret.
//! 4. Build the Axum router and start the HTTP server.

mod config;
mod server;
mod telemetry;

use std::time::Duration;

use anyhow::Result;
use credential_cipher::CredentialCipher;
use tracing::{info, warn};

use config::Config;
use server::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // -----------------------------------------------------------------------
    // 1. Configuration
    // -----------------------------------------------------------------------
    let cfg = Config::from_env().map_err(|e| {
        // Telemetry is not yet up; write to stderr directly.
        eprintln!("ERROR: configuration invalid: {e}");
        e
    })?;

    // -----------------------------------------------------------------------
    // 2. Telemetry
    // -----------------------------------------------------------------------
    telemetry::init_telemetry(cfg.otlp_endpoint(), &cfg.log_level)?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        port = cfg.listen_port,
        strict_decrypt = cfg.strict_decrypt,
        "cipher-svc starting"
    );

    // -----------------------------------------------------------------------
    // 3. Cipher
    // -----------------------------------------------------------------------
    let cipher = CredentialCipher::new(cfg.cipher_config());
    if cipher.is_enabled() {
        info!("credential encryption enabled");
    } else {
        warn!("ENCRYPTION_KEY not set; credentials will pass through as plaintext");
    }

    // -----------------------------------------------------------------------
    // 4. HTTP server
    // -----------------------------------------------------------------------
    let state = AppState::new(cipher, cfg.strict_decrypt);
    let timeout = Duration::from_secs(cfg.request_timeout_secs);
    let router = server::router::build(state, timeout);

    let addr: std::net::SocketAddr = ([0, 0, 0, 0], cfg.listen_port).into();
    info!(addr = %addr, "listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
