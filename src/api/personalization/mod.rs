/*
* Re-ranking, user profiles, feedback and preferences.
*/

pub mod handler;
pub mod routes;

pub use routes::personalization_routes;
