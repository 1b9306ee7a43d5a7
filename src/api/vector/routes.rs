// Start of file: /src/api/vector/routes.rs

use axum::{
    routing::{delete, get, post},
    Router,
};

use super::handler;
use crate::config::state::AppState;

pub fn vector_routes() -> Router<AppState> {
    Router::new()
        .route("/vector/embed", post(handler::embed_handler))
        .route("/vector/search", post(handler::search_handler))
        .route("/vector/upsert", post(handler::upsert_handler))
        .route("/vector/collections", get(handler::list_collections_handler))
        .route("/vector/collections/{name}", delete(handler::delete_collection_handler))
}

// End of file: /src/api/vector/routes.rs
