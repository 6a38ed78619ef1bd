//! Structured logging and optional OTLP trace export.
//!
//! # Telemetry invariants
//!
//! - **No credential plaintext, envelope, or key material** may appear in any
//!   span attribute or log field. Handlers log lengths and outcomes only.
//! - Log level is configurable via `LOG_LEVEL` (default: `info`), overridden
//!   by `RUST_LOG` when set.

pub mod init;

pub use init::init_telemetry;
