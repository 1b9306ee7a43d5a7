// Start of file: /src/services/scheduler/tasks.rs

// * Named async task handlers that scheduled jobs run.

use std::sync::{Arc, Weak};

use anyhow::{anyhow, Context};
use dashmap::DashMap;
use futures::future::{BoxFuture, FutureExt};
use serde_json::{json, Map, Value};
use tracing::info;

use crate::models::backup::{BackupJob, BackupJobCreate, BackupType};
use crate::models::notification::{Notification, NotificationResult, NotificationStatus};
use crate::services::backup::BackupService;
use crate::services::notification::NotificationService;

/// What a handler receives for one run.
#[derive(Debug, Clone)]
pub struct TaskContext {
    pub job_id: String,
    pub args: Vec<Value>,
    pub kwargs: Map<String, Value>,
}

pub type TaskHandler = Arc<dyn Fn(TaskContext) -> BoxFuture<'static, anyhow::Result<Value>> + Send + Sync>;

#[derive(Clone, Default)]
pub struct TaskRegistry {
    handlers: Arc<DashMap<String, TaskHandler>>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the tasks that need no other service.
    pub fn with_defaults() -> Self {
        let registry: TaskRegistry = Self::new();
        registry.register("noop", noop_task());
        registry.register("log", log_task());
        registry
    }

    pub fn register(&self, name: impl Into<String>, handler: TaskHandler) {
        self.handlers.insert(name.into(), handler);
    }

    pub fn get(&self, name: &str) -> Option<TaskHandler> {
        self.handlers.get(name).map(|entry| entry.value().clone())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.handlers.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }
}

impl std::fmt::Debug for TaskRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskRegistry").field("tasks", &self.names()).finish()
    }
}

pub fn noop_task() -> TaskHandler {
    Arc::new(|_ctx: TaskContext| async { Ok::<Value, anyhow::Error>(Value::Null) }.boxed())
}

/// Logs `kwargs.message` at info.
pub fn log_task() -> TaskHandler {
    Arc::new(|ctx: TaskContext| log_message(ctx).boxed())
}

async fn log_message(ctx: TaskContext) -> anyhow::Result<Value> {
    let message: String = ctx
        .kwargs
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or("scheduled job ran")
        .to_owned();
    info!(job_id = %ctx.job_id, "{message}");
    Ok(json!({ "logged": message }))
}

/// Starts a backup of `kwargs.backup_type` (default `full`).
/// Holds a weak reference since the backup service snapshots the scheduler.
pub fn backup_task(backup: Weak<BackupService>) -> TaskHandler {
    Arc::new(move |ctx: TaskContext| run_backup(backup.clone(), ctx).boxed())
}

async fn run_backup(backup: Weak<BackupService>, ctx: TaskContext) -> anyhow::Result<Value> {
    let service: Arc<BackupService> = backup
        .upgrade()
        .ok_or_else(|| anyhow!("backup service is no longer running"))?;

    let backup_type: BackupType = match ctx.kwargs.get("backup_type") {
        Some(value) => serde_json::from_value(value.clone()).context("invalid backup_type")?,
        None => BackupType::Full,
    };
    let description: Option<String> = ctx
        .kwargs
        .get("description")
        .and_then(Value::as_str)
        .map(str::to_owned)
        .or_else(|| Some(format!("Scheduled by job {}", ctx.job_id)));

    let job: BackupJob = service
        .create_backup(BackupJobCreate { backup_type, description })
        .await?;
    Ok(json!({ "backup_id": job.id }))
}

/// Sends `kwargs` as a notification. A failed delivery fails the run.
pub fn notify_task(notifications: Arc<NotificationService>) -> TaskHandler {
    Arc::new(move |ctx: TaskContext| run_notify(notifications.clone(), ctx).boxed())
}

async fn run_notify(notifications: Arc<NotificationService>, ctx: TaskContext) -> anyhow::Result<Value> {
    let notification: Notification =
        serde_json::from_value(Value::Object(ctx.kwargs)).context("kwargs are not a notification")?;
    let result: NotificationResult = notifications.send_notification(notification).await;

    if result.status == NotificationStatus::Failed {
        return Err(anyhow!(result
            .error_message
            .unwrap_or_else(|| "notification failed".to_owned())));
    }
    Ok(serde_json::to_value(result)?)
}

// End of file: /src/services/scheduler/tasks.rs
