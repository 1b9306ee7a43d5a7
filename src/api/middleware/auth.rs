// Start of file: /src/api/middleware/auth.rs

use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use serde_json::json;
use tracing::warn;

use crate::config::environment::EnvironmentVariables;
use crate::config::state::AppState;
use crate::utils::response_handler::HandlerResponse;

/// Whether `key` is acceptable. With no configured keys any non-empty key passes.
pub fn key_accepted(env: &EnvironmentVariables, key: &str) -> bool {
    if key.is_empty() {
        return false;
    }
    env.api_keys.is_empty() || env.api_keys.iter().any(|k| k == key)
}

/// Guards every `/api/v1` route with the configured API key header.
pub async fn api_key_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Result<Response, HandlerResponse> {
    let header_name: &str = state.environment.api_key_header.as_ref();

    let key: &str = headers
        .get(header_name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| {
            HandlerResponse::new(StatusCode::UNAUTHORIZED)
                .message(format!("Missing API key. Send it in the {header_name} header"))
                .data(json!({ "error": "missing_api_key" }))
        })?;

    if !key_accepted(&state.environment, key) {
        warn!("Rejected request with an invalid API key");
        return Err(HandlerResponse::new(StatusCode::UNAUTHORIZED)
            .message("Invalid API key")
            .data(json!({ "error": "invalid_api_key" })));
    }

    Ok(next.run(request).await)
}

// End of file: /src/api/middleware/auth.rs

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(keys: &str) -> EnvironmentVariables {
        let vars: HashMap<String, String> =
            HashMap::from([("LLAMASEARCH_API_KEYS".to_owned(), keys.to_owned())]);
        EnvironmentVariables::from_map(&vars).unwrap()
    }

    #[test]
    fn empty_key_list_accepts_any_key() {
        let env: EnvironmentVariables = env("");
        assert!(key_accepted(&env, "anything"));
        assert!(!key_accepted(&env, ""));
    }

    #[test]
    fn listed_keys_only() {
        let env: EnvironmentVariables = env("alpha,beta");
        assert!(key_accepted(&env, "beta"));
        assert!(!key_accepted(&env, "gamma"));
    }
}
