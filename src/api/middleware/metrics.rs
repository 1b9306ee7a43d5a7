// Start of file: /src/api/middleware/metrics.rs

use std::time::{Duration, Instant};

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::debug;

use crate::config::state::AppState;

/// Feeds request count, status and latency into the monitoring counters.
pub async fn request_metrics_middleware(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let started: Instant = Instant::now();
    let path: String = request.uri().path().to_owned();

    let response: Response = next.run(request).await;
    let elapsed: Duration = started.elapsed();

    state.monitoring.requests().record(response.status().as_u16(), elapsed);
    debug!("{path} -> {} in {:.2}ms", response.status().as_u16(), elapsed.as_secs_f64() * 1000.0);

    response
}

// End of file: /src/api/middleware/metrics.rs
