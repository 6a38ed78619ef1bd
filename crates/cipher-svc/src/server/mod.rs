//! Axum HTTP server and routing.
//!
//! # Responsibilities
//! - Define the Axum router with the encryption routes and shared layers.
//! - Inject shared application state (`AppState`) into handlers.
//! - Render every error status, including body rejections, as JSON.

pub mod extract;
pub mod handlers;
pub mod router;
pub mod state;
