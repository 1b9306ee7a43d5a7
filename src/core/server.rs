// Start of file: /src/core/server.rs

// * Router assembly, listener setup and graceful shutdown.

use std::{sync::Arc, time::Duration};

use anyhow::Result;
use axum::{
    error_handling::HandleErrorLayer,
    extract::DefaultBodyLimit,
    http::{HeaderValue, StatusCode},
    middleware::{from_fn, from_fn_with_state},
    Router,
};
use listenfd::ListenFd;
use serde_json::json;
use tokio::{net::TcpListener, signal};
use tower::{timeout::TimeoutLayer, ServiceBuilder};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info, warn};

use crate::api::{
    backup::backup_routes,
    middleware::{allowed_host_middleware, api_key_middleware, request_metrics_middleware},
    monitor::monitor_routes,
    notifications::notification_routes,
    personalization::personalization_routes,
    scheduler::scheduler_routes,
    search::search_routes,
    system::{health_routes, validate_routes},
    vector::vector_routes,
};
use crate::config::{environment::EnvironmentVariables, state::AppState};
use crate::services::SchedulerService;
use crate::utils::{
    error_handler::handle_global_error,
    response_handler::{response_wrapper, HandlerResponse},
};

/// Prefix for every authenticated route.
pub const API_PREFIX: &str = "/api/v1";

/// Builds the `/api/v1` router from the enabled feature groups.
fn api_routes(env: &EnvironmentVariables) -> Router<AppState> {
    let mut router: Router<AppState> = Router::new().merge(validate_routes());

    let groups: [(&str, fn() -> Router<AppState>); 7] = [
        ("metasearch", search_routes),
        ("vector", vector_routes),
        ("personalization", personalization_routes),
        ("scheduler", scheduler_routes),
        ("backup", backup_routes),
        ("monitor", monitor_routes),
        ("notifications", notification_routes),
    ];

    for (feature, routes) in groups {
        if env.feature_enabled(feature) {
            router = router.merge(routes());
        } else {
            info!("Feature '{feature}' disabled; its routes are not mounted");
        }
    }

    router
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let base: CorsLayer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return base.allow_origin(Any);
    }

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin '{origin}'");
                None
            }
        })
        .collect();

    base.allow_origin(AllowOrigin::list(parsed))
}

async fn not_found_fallback() -> HandlerResponse {
    HandlerResponse::new(StatusCode::NOT_FOUND)
        .message("The requested resource was not found")
        .data(json!({ "error": "not_found" }))
}

/// Creates the application router with all middleware layers
pub fn create_app(state: AppState) -> Router {
    let env: Arc<EnvironmentVariables> = state.environment.clone();

    let api: Router<AppState> =
        api_routes(&env).route_layer(from_fn_with_state(state.clone(), api_key_middleware));

    Router::new()
        .nest(API_PREFIX, api)
        .merge(health_routes())
        .fallback(not_found_fallback)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&env.cors_origins))
                .layer(from_fn_with_state(state.clone(), request_metrics_middleware))
                .layer(from_fn(response_wrapper))
                .layer(from_fn_with_state(state.clone(), allowed_host_middleware))
                .layer(HandleErrorLayer::new(handle_global_error))
                .layer(TimeoutLayer::new(Duration::from_secs(env.request_timeout_seconds)))
                .layer(DefaultBodyLimit::max(env.max_request_body_size)),
        )
        .with_state(state)
}

/// Sets up the TCP listener from environment or binds to new address
pub async fn setup_listener(env: &EnvironmentVariables) -> Result<TcpListener> {
    let mut listenfd: ListenFd = ListenFd::from_env();

    let listener: TcpListener = match listenfd.take_tcp_listener(0)? {
        Some(std_listener) => {
            std_listener.set_nonblocking(true)?;
            TcpListener::from_std(std_listener)?
        }
        None => {
            let addr: String = format!("{}:{}", env.host, env.port);
            TcpListener::bind(&addr).await?
        }
    };

    Ok(listener)
}

/// Handles graceful shutdown signals (Ctrl+C and TERM), then stops the scheduler loop
pub async fn shutdown_signal(scheduler: Arc<SchedulerService>) {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                error!("Failed to install TERM handler: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate: std::future::Pending<()> = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Shutting down via Ctrl+C"),
        _ = terminate => info!("Shutting down via TERM signal"),
    }

    scheduler.stop();
}

// End of file: /src/core/server.rs
