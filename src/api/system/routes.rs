// Start of file: /src/api/system/routes.rs

use axum::{routing::get, Router};

use super::handler;
use crate::config::state::AppState;

/// Public routes, mounted outside `/api/v1`.
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(handler::health_handler))
}

pub fn validate_routes() -> Router<AppState> {
    Router::new().route("/validate", get(handler::validate_handler))
}

// End of file: /src/api/system/routes.rs
