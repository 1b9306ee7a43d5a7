// Start of file: /src/api/scheduler/routes.rs

use axum::{
    routing::{get, post},
    Router,
};

use super::handler;
use crate::config::state::AppState;

pub fn scheduler_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/scheduler/jobs",
            post(handler::create_job_handler).get(handler::list_jobs_handler),
        )
        .route(
            "/scheduler/jobs/{job_id}",
            get(handler::get_job_handler)
                .put(handler::update_job_handler)
                .delete(handler::delete_job_handler),
        )
        .route("/scheduler/jobs/{job_id}/trigger", post(handler::trigger_job_handler))
}

// End of file: /src/api/scheduler/routes.rs
