// Start of file: /src/api/scheduler/handler.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use tracing::{info, instrument};

use crate::config::state::AppState;
use crate::models::scheduler::{Job, JobCreate, JobListParams, JobUpdate};
use crate::utils::response_handler::{HandlerResponse, HandlerResult};

#[instrument(name = "create_job", skip(state, create), fields(task = %create.task_name))]
pub async fn create_job_handler(State(state): State<AppState>, Json(create): Json<JobCreate>) -> HandlerResult {
    let job: Job = state.scheduler.schedule_job(create).await?;
    info!("Job {} created", job.id);

    Ok(HandlerResponse::new(StatusCode::CREATED)
        .json(&job)
        .message("Job scheduled"))
}

#[instrument(name = "list_jobs", skip(state))]
pub async fn list_jobs_handler(State(state): State<AppState>, Query(params): Query<JobListParams>) -> HandlerResult {
    let jobs: Vec<Job> = state.scheduler.list_jobs(params.status, params.limit, params.offset).await?;
    Ok(HandlerResponse::ok().json(&jobs))
}

#[instrument(name = "get_job", skip(state))]
pub async fn get_job_handler(State(state): State<AppState>, Path(job_id): Path<String>) -> HandlerResult {
    let job: Job = state.scheduler.get_job(&job_id).await?;
    Ok(HandlerResponse::ok().json(&job))
}

#[instrument(name = "update_job", skip(state, update))]
pub async fn update_job_handler(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
    Json(update): Json<JobUpdate>,
) -> HandlerResult {
    let job: Job = state.scheduler.update_job(&job_id, update).await?;
    Ok(HandlerResponse::ok().json(&job).message("Job updated"))
}

#[instrument(name = "delete_job", skip(state))]
pub async fn delete_job_handler(State(state): State<AppState>, Path(job_id): Path<String>) -> HandlerResult {
    state.scheduler.delete_job(&job_id).await?;
    Ok(HandlerResponse::new(StatusCode::NO_CONTENT))
}

/// Starts the job now; the run continues after the response.
#[instrument(name = "trigger_job", skip(state))]
pub async fn trigger_job_handler(State(state): State<AppState>, Path(job_id): Path<String>) -> HandlerResult {
    let job: Job = state.scheduler.trigger_job(&job_id).await?;

    Ok(HandlerResponse::new(StatusCode::ACCEPTED)
        .json(&job)
        .message(format!("Job {job_id} triggered")))
}

// End of file: /src/api/scheduler/handler.rs
