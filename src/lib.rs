// Library root for the LlamaSearch API server and client

pub mod api;
pub mod client;
pub mod config;
pub mod core;
pub mod database;
pub mod models;
pub mod services;
pub mod utils;

pub use crate::client::{ClientError, SearchClient};
pub use crate::config::environment::EnvironmentVariables;
pub use crate::config::state::AppState;
pub use crate::core::server::{create_app, setup_listener, shutdown_signal};
