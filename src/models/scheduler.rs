// Start of file: /src/models/scheduler.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// When a job runs. Exactly one of the fields must be set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Schedule {
    #[serde(default)]
    pub run_once_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub interval_seconds: Option<u64>,
    #[serde(default)]
    pub cron_expression: Option<String>,
}

impl Schedule {
    pub fn is_recurring(&self) -> bool {
        self.run_once_at.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Job {
    pub id: String,
    pub task_name: String,
    pub schedule: Schedule,
    pub args: Vec<Value>,
    pub kwargs: Map<String, Value>,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub next_run_time: Option<DateTime<Utc>>,
    pub last_run_time: Option<DateTime<Utc>>,
    pub last_result: Option<Value>,
    pub last_error: Option<String>,
    pub run_count: u64,
    pub timeout_seconds: u64,
    pub max_retries: u32,
    /// Retries still available for the current run.
    pub retries_left: u32,
    pub retry_delay_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobCreate {
    pub task_name: String,
    pub schedule: Schedule,
    #[serde(default)]
    pub args: Vec<Value>,
    #[serde(default)]
    pub kwargs: Map<String, Value>,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_delay")]
    pub retry_delay_seconds: u64,
}

fn default_timeout() -> u64 {
    300
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay() -> u64 {
    60
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct JobUpdate {
    #[serde(default)]
    pub task_name: Option<String>,
    #[serde(default)]
    pub schedule: Option<Schedule>,
    #[serde(default)]
    pub args: Option<Vec<Value>>,
    #[serde(default)]
    pub kwargs: Option<Map<String, Value>>,
    #[serde(default)]
    pub status: Option<JobStatus>,
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
    #[serde(default)]
    pub max_retries: Option<u32>,
    #[serde(default)]
    pub retry_delay_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JobListParams {
    #[serde(default)]
    pub status: Option<JobStatus>,
    #[serde(default = "default_list_limit")]
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
}

fn default_list_limit() -> usize {
    100
}

// End of file: /src/models/scheduler.rs
