/*
* Request middleware: API key auth, Host header check and request metrics.
*/

pub mod auth;
pub mod host;
pub mod metrics;

pub use auth::api_key_middleware;
pub use host::allowed_host_middleware;
pub use metrics::request_metrics_middleware;
