// Start of file: /src/api/mod.rs

/*
    * HTTP surface: one folder per feature area (handler.rs + routes.rs)
    * plus the request middleware.
*/

pub mod backup;
pub mod middleware;
pub mod monitor;
pub mod notifications;
pub mod personalization;
pub mod scheduler;
pub mod search;
pub mod system;
pub mod vector;

// End of file: /src/api/mod.rs
