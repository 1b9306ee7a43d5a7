// Start of file: /src/api/backup/routes.rs

use axum::{
    routing::{get, post},
    Router,
};

use super::handler;
use crate::config::state::AppState;

pub fn backup_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/backup/jobs",
            post(handler::create_backup_handler).get(handler::list_backups_handler),
        )
        .route(
            "/backup/jobs/{job_id}",
            get(handler::get_backup_handler).delete(handler::delete_backup_handler),
        )
        .route("/backup/jobs/{job_id}/download", get(handler::download_backup_handler))
        .route("/backup/restore", post(handler::restore_handler))
        .route("/backup/restore/jobs", get(handler::list_restore_jobs_handler))
        .route("/backup/restore/jobs/{job_id}", get(handler::get_restore_job_handler))
}

// End of file: /src/api/backup/routes.rs
