// Start of file: /src/api/monitor/routes.rs

use axum::{routing::get, Router};

use super::handler;
use crate::config::state::AppState;

pub fn monitor_routes() -> Router<AppState> {
    Router::new()
        .route("/monitor/metrics", get(handler::metrics_handler))
        .route("/monitor/status", get(handler::status_handler))
        .route("/monitor/status/{service_name}", get(handler::service_status_handler))
        .route("/monitor/logs", get(handler::logs_handler))
}

// End of file: /src/api/monitor/routes.rs
