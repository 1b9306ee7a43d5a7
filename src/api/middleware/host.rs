// Start of file: /src/api/middleware/host.rs

use axum::{
    extract::{Request, State},
    http::{header::HOST, StatusCode},
    middleware::Next,
    response::Response,
};
use serde_json::json;
use tracing::warn;

use crate::config::state::AppState;
use crate::utils::response_handler::HandlerResponse;

/// `*` allows everything; entries may be `*.example.com` wildcards.
pub fn host_allowed(allowed: &[String], host: &str) -> bool {
    let host: String = strip_port(host).to_ascii_lowercase();

    allowed.iter().any(|entry| {
        let entry: String = entry.trim().to_ascii_lowercase();
        match entry.strip_prefix("*.") {
            _ if entry == "*" => true,
            Some(suffix) => host.ends_with(&format!(".{suffix}")) || host == suffix,
            None => host == entry,
        }
    })
}

fn strip_port(host: &str) -> &str {
    // Bracketed IPv6 literal
    if let Some(rest) = host.strip_prefix('[') {
        return rest.split(']').next().unwrap_or(rest);
    }
    host.split(':').next().unwrap_or(host)
}

/// Rejects requests whose Host header is not in ALLOWED_HOSTS.
pub async fn allowed_host_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, HandlerResponse> {
    let allowed: &[String] = &state.environment.allowed_hosts;
    if allowed.iter().any(|h| h.trim() == "*") {
        return Ok(next.run(request).await);
    }

    let host: &str = request
        .headers()
        .get(HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    if !host_allowed(allowed, host) {
        warn!("Rejected request for host '{host}'");
        return Err(HandlerResponse::new(StatusCode::BAD_REQUEST)
            .message("Invalid host header")
            .data(json!({ "error": "invalid_host" })));
    }

    Ok(next.run(request).await)
}

// End of file: /src/api/middleware/host.rs
