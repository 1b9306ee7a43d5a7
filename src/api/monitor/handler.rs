// Start of file: /src/api/monitor/handler.rs

use std::collections::BTreeMap;

use axum::extract::{Path, Query, State};
use serde_json::json;
use tracing::instrument;

use crate::config::state::AppState;
use crate::models::monitoring::{LogEntry, LogQuery, ServiceStatus, SystemMetrics};
use crate::utils::response_handler::{HandlerResponse, HandlerResult};

#[instrument(name = "metrics", skip(state))]
pub async fn metrics_handler(State(state): State<AppState>) -> HandlerResponse {
    let metrics: SystemMetrics = state.monitoring.get_system_metrics().await;
    HandlerResponse::ok().json(&metrics)
}

#[instrument(name = "status", skip(state))]
pub async fn status_handler(State(state): State<AppState>) -> HandlerResult {
    let statuses: BTreeMap<String, ServiceStatus> = state.monitoring.get_service_status(None).await?;
    Ok(HandlerResponse::ok().json(&statuses))
}

#[instrument(name = "service_status", skip(state))]
pub async fn service_status_handler(
    State(state): State<AppState>,
    Path(service_name): Path<String>,
) -> HandlerResult {
    let statuses: BTreeMap<String, ServiceStatus> =
        state.monitoring.get_service_status(Some(&service_name)).await?;
    Ok(HandlerResponse::ok().json(&statuses))
}

// No #[instrument] here: its own span events would land in the buffer being read
pub async fn logs_handler(State(state): State<AppState>, Query(query): Query<LogQuery>) -> HandlerResult {
    let logs: Vec<LogEntry> = state.monitoring.get_logs(&query)?;

    Ok(HandlerResponse::ok().data(json!({
        "count": logs.len(),
        "logs": logs,
    })))
}

// End of file: /src/api/monitor/handler.rs
