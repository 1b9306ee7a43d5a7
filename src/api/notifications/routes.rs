// Start of file: /src/api/notifications/routes.rs

use axum::{
    routing::{get, post},
    Router,
};

use super::handler;
use crate::config::state::AppState;

pub fn notification_routes() -> Router<AppState> {
    Router::new()
        .route("/notifications/send", post(handler::send_handler))
        .route("/notifications/history", get(handler::history_handler))
}

// End of file: /src/api/notifications/routes.rs
