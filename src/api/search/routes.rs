// Start of file: /src/api/search/routes.rs

use axum::{
    routing::{get, post},
    Router,
};

use super::handler;
use crate::config::state::AppState;

pub fn search_routes() -> Router<AppState> {
    Router::new()
        .route("/search", post(handler::search_handler))
        .route("/search/analyze", get(handler::analyze_handler))
        .route("/search/trends", get(handler::trends_handler))
}

// End of file: /src/api/search/routes.rs
