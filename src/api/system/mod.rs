/*
* Health and key validation endpoints.
*/

pub mod handler;
pub mod routes;

pub use routes::{health_routes, validate_routes};
