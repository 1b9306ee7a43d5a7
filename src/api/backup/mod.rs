/*
* Backup and restore jobs.
*/

pub mod handler;
pub mod routes;

pub use routes::backup_routes;
