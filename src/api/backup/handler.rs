// Start of file: /src/api/backup/handler.rs

use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{
        header::{CONTENT_DISPOSITION, CONTENT_TYPE},
        HeaderValue, StatusCode,
    },
    response::{IntoResponse, Response},
    Json,
};
use tracing::{info, instrument};

use crate::config::state::AppState;
use crate::models::backup::{BackupJob, BackupJobCreate, BackupListParams, RestoreJob, RestoreJobCreate};
use crate::models::common::Page;
use crate::utils::response_handler::{HandlerResponse, HandlerResult, Passthrough};

#[instrument(name = "create_backup", skip(state, create), fields(backup_type = %create.backup_type))]
pub async fn create_backup_handler(
    State(state): State<AppState>,
    Json(create): Json<BackupJobCreate>,
) -> HandlerResult {
    let job: BackupJob = state.backup.create_backup(create).await?;

    Ok(HandlerResponse::new(StatusCode::ACCEPTED)
        .json(&job)
        .message("Backup job started"))
}

#[instrument(name = "list_backups", skip(state))]
pub async fn list_backups_handler(
    State(state): State<AppState>,
    Query(params): Query<BackupListParams>,
) -> HandlerResult {
    let jobs: Vec<BackupJob> = state.backup.list_backups(params.status, params.limit, params.offset).await?;
    Ok(HandlerResponse::ok().json(&jobs))
}

#[instrument(name = "get_backup", skip(state))]
pub async fn get_backup_handler(State(state): State<AppState>, Path(job_id): Path<String>) -> HandlerResult {
    let job: BackupJob = state.backup.get_backup(&job_id).await?;
    Ok(HandlerResponse::ok().json(&job))
}

#[instrument(name = "delete_backup", skip(state))]
pub async fn delete_backup_handler(State(state): State<AppState>, Path(job_id): Path<String>) -> HandlerResult {
    state.backup.delete_backup(&job_id).await?;
    Ok(HandlerResponse::new(StatusCode::NO_CONTENT))
}

/// Streams the gzip file itself, outside the JSON envelope.
#[instrument(name = "download_backup", skip(state))]
pub async fn download_backup_handler(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Response, HandlerResponse> {
    let (file_name, bytes) = state.backup.download(&job_id).await?;
    info!("Serving backup file {file_name} ({} bytes)", bytes.len());

    let disposition: HeaderValue = HeaderValue::from_str(&format!("attachment; filename=\"{file_name}\""))
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"));

    let mut response: Response = (
        StatusCode::OK,
        [(CONTENT_TYPE, HeaderValue::from_static("application/gzip")), (CONTENT_DISPOSITION, disposition)],
        Body::from(bytes),
    )
        .into_response();
    response.extensions_mut().insert(Passthrough);

    Ok(response)
}

#[instrument(name = "restore_backup", skip(state, create), fields(source = %create.source_backup_id))]
pub async fn restore_handler(
    State(state): State<AppState>,
    Json(create): Json<RestoreJobCreate>,
) -> HandlerResult {
    let job: RestoreJob = state.backup.restore_from_backup(create).await?;

    Ok(HandlerResponse::new(StatusCode::ACCEPTED)
        .json(&job)
        .message("Restore job started"))
}

#[instrument(name = "list_restore_jobs", skip(state))]
pub async fn list_restore_jobs_handler(State(state): State<AppState>, Query(page): Query<Page>) -> HandlerResult {
    let jobs: Vec<RestoreJob> = state.backup.list_restore_jobs(page.limit, page.offset).await?;
    Ok(HandlerResponse::ok().json(&jobs))
}

#[instrument(name = "get_restore_job", skip(state))]
pub async fn get_restore_job_handler(State(state): State<AppState>, Path(job_id): Path<String>) -> HandlerResult {
    let job: RestoreJob = state.backup.get_restore_job(&job_id).await?;
    Ok(HandlerResponse::ok().json(&job))
}

// End of file: /src/api/backup/handler.rs
