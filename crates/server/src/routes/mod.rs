//! API route handlers
//!
//! - `health`: liveness and readiness probes
//! - `notifications`: storage-change notifications, one pipeline invocation each
//! - `callback`: results posted back by the processing service

pub mod callback;
pub mod health;
pub mod notifications;

use crate::error::{ServerError, ServerResult};
use crate::state::ServerState;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use std::sync::Arc;

/// Service info (GET /)
///
/// # Response
///
/// ```json
/// {
///   "name": "imgmeta",
///   "version": "0.1.0",
///   "strategy": "remote",
///   "endpoints": ["..."]
/// }
/// ```
pub async fn api_info(State(state): State<Arc<ServerState>>) -> ServerResult<impl IntoResponse> {
    Ok(Json(json!({
        "name": "imgmeta",
        "version": env!("CARGO_PKG_VERSION"),
        "strategy": state.strategy.name(),
        "endpoints": [
            "/notifications",
            state.config.callback_path,
            "/health",
            "/ready"
        ]
    })))
}

/// 404 Not Found handler
pub async fn not_found() -> ServerError {
    ServerError::NotFound
}
