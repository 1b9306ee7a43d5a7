/*
* Scheduled job management.
*/

pub mod handler;
pub mod routes;

pub use routes::scheduler_routes;
