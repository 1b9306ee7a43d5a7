// Start of file: /src/models/mod.rs

/*
    * Request and response types shared by the services and the HTTP layer.
*/

pub mod backup;
pub mod common;
pub mod monitoring;
pub mod notification;
pub mod personalization;
pub mod scheduler;
pub mod search;
pub mod vector;

// End of file: /src/models/mod.rs
