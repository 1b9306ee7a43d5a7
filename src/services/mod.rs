// Start of file: /src/services/mod.rs

/*
    * Business logic behind each route group. Services own their state and
    * are shared through `AppState` as `Arc`s.
*/

pub mod backup;
pub mod monitoring;
pub mod notification;
pub mod personalization;
pub mod scheduler;
pub mod search;
pub mod vector;

pub use backup::BackupService;
pub use monitoring::MonitoringService;
pub use notification::NotificationService;
pub use personalization::PersonalizationService;
pub use scheduler::SchedulerService;
pub use search::SearchService;
pub use vector::VectorService;

// End of file: /src/services/mod.rs
