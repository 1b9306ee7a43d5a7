/*
* Metrics, service status and recent logs.
*/

pub mod handler;
pub mod routes;

pub use routes::monitor_routes;
