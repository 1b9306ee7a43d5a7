// Start of file: /src/api/personalization/routes.rs

use axum::{
    routing::{get, post},
    Router,
};

use super::handler;
use crate::config::state::AppState;

pub fn personalization_routes() -> Router<AppState> {
    Router::new()
        .route("/personalization/rerank", post(handler::rerank_handler))
        .route(
            "/personalization/profile/{user_id}",
            get(handler::get_profile_handler).put(handler::update_profile_handler),
        )
        .route("/personalization/feedback", post(handler::feedback_handler))
        .route(
            "/personalization/preferences/{user_id}",
            get(handler::get_preferences_handler).put(handler::set_preference_handler),
        )
}

// End of file: /src/api/personalization/routes.rs
