// Start of file: /src/main.rs

use std::time::Duration;

use anyhow::{Context, Result};
use axum::{serve, Router};
use tokio::{net::TcpListener, runtime::Runtime};
use tracing::{debug, error, info, warn};

use llamasearch::{
    config::{environment::EnvironmentVariables, state::AppState},
    core::{
        logging::init_tracing,
        server::{create_app, setup_listener, shutdown_signal},
    },
};

fn main() -> Result<()> {
    // * Config comes first: the worker count and log level depend on it
    let env: &'static EnvironmentVariables = EnvironmentVariables::instance()?;

    init_tracing(env.log_level_directive(), env.debug);

    for warning in &env.warnings {
        warn!("{warning}");
    }
    info!(
        "Starting LlamaSearch in {} mode on {}:{} (log level {})",
        env.environment, env.host, env.port, env.log_level
    );
    if env.debug {
        debug!("Configuration: {}", env.redacted());
    }

    let runtime: Runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(env.workers.max(1))
        .enable_all()
        .build()
        .context("Failed to build the Tokio runtime")?;

    runtime.block_on(run(env))
}

async fn run(env: &'static EnvironmentVariables) -> Result<()> {
    let state: &'static AppState = AppState::instance()?;

    if let Some(redis) = state.search.redis() {
        if let Err(err) = redis.initialize().await {
            warn!("Redis unreachable, falling back to the in-process cache only: {err:#}");
        }
    }

    let tick: Duration = Duration::from_secs(env.scheduler_tick_seconds.max(1));
    if env.feature_enabled("scheduler") {
        state.scheduler.start(tick);
    }

    let app: Router = create_app(state.clone());
    let listener: TcpListener = setup_listener(env).await?;

    info!("Server listening on: {}", listener.local_addr()?);

    if let Err(err) = serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(state.scheduler.clone()))
        .await
    {
        error!("Server error: {err}");
        return Err(err.into());
    }

    info!("Server stopped");
    Ok(())
}

// End of file: /src/main.rs
