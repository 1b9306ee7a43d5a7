// Start of file: /src/api/system/handler.rs

use axum::extract::State;
use serde_json::json;
use tracing::{info, instrument};

use crate::config::state::AppState;
use crate::models::common::API_VERSION;
use crate::utils::response_handler::HandlerResponse;

/// Liveness probe. Needs no API key.
#[instrument(skip(state))]
pub async fn health_handler(State(state): State<AppState>) -> HandlerResponse {
    HandlerResponse::ok().data(json!({
        "status": "ok",
        "version": API_VERSION,
        "uptime": state.uptime_seconds(),
    }))
}

/// Reached only when the auth middleware accepted the key.
#[instrument]
pub async fn validate_handler() -> HandlerResponse {
    info!("API key validated");
    HandlerResponse::ok()
        .data(json!({ "valid": true }))
        .message("API key is valid")
}

// End of file: /src/api/system/handler.rs
