// Start of file: /src/models/backup.rs

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Which services a snapshot covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackupType {
    Full,
    Vectors,
    Personalization,
    Scheduler,
}

impl BackupType {
    pub fn includes_vectors(self) -> bool {
        matches!(self, BackupType::Full | BackupType::Vectors)
    }

    pub fn includes_personalization(self) -> bool {
        matches!(self, BackupType::Full | BackupType::Personalization)
    }

    pub fn includes_scheduler(self) -> bool {
        matches!(self, BackupType::Full | BackupType::Scheduler)
    }
}

impl fmt::Display for BackupType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name: &str = match self {
            BackupType::Full => "full",
            BackupType::Vectors => "vectors",
            BackupType::Personalization => "personalization",
            BackupType::Scheduler => "scheduler",
        };
        f.write_str(name)
    }
}

/// Lifecycle shared by backup and restore jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackupJobStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

pub type RestoreJobStatus = BackupJobStatus;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BackupJob {
    pub id: String,
    pub backup_type: BackupType,
    pub description: Option<String>,
    pub status: BackupJobStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub duration_seconds: Option<f64>,
    /// Relative to the storage directory.
    pub file_path: Option<String>,
    pub file_size_bytes: Option<u64>,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupJobCreate {
    pub backup_type: BackupType,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RestoreJob {
    pub id: String,
    pub source_backup_id: String,
    pub restore_options: Map<String, Value>,
    pub status: RestoreJobStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub duration_seconds: Option<f64>,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestoreJobCreate {
    pub source_backup_id: String,
    #[serde(default)]
    pub restore_options: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BackupListParams {
    #[serde(default)]
    pub status: Option<BackupJobStatus>,
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
}

fn default_limit() -> usize {
    100
}

// End of file: /src/models/backup.rs
