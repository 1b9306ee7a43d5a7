// Start of file: /src/services/backup.rs

// * Backup and restore of in-process state as gzip-compressed JSON snapshots
// * under STORAGE_DIR/backups.

use std::{
    collections::BTreeMap,
    io::{Read, Write},
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use flate2::{read::GzDecoder, write::GzEncoder, Compression};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::models::backup::{
    BackupJob, BackupJobCreate, BackupJobStatus, BackupType, RestoreJob, RestoreJobCreate,
    RestoreJobStatus,
};
use crate::models::scheduler::Job;
use crate::services::personalization::{PersonalizationService, PersonalizationSnapshot};
use crate::services::scheduler::SchedulerService;
use crate::services::vector::{VectorService, VectorSnapshot};
use crate::utils::error_handler::ServiceError;
use crate::utils::utils::{clamp_limit, paginate};

pub const BACKUP_DIR_NAME: &str = "backups";
pub const ARCHIVE_FORMAT_VERSION: u32 = 1;
const MAX_LIST_LIMIT: usize = 1000;

/// On-disk layout of one backup file.
#[derive(Debug, Serialize, Deserialize)]
pub struct BackupArchive {
    pub format_version: u32,
    pub backup_id: String,
    pub backup_type: BackupType,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub vectors: Option<VectorSnapshot>,
    #[serde(default)]
    pub personalization: Option<PersonalizationSnapshot>,
    #[serde(default)]
    pub scheduler: Option<BTreeMap<String, Job>>,
}

pub fn encode_archive(archive: &BackupArchive) -> Result<Vec<u8>> {
    let json: Vec<u8> = serde_json::to_vec(archive).context("Failed to serialize backup")?;
    let mut encoder: GzEncoder<Vec<u8>> = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&json).context("Failed to compress backup")?;
    encoder.finish().context("Failed to finish backup compression")
}

pub fn decode_archive(bytes: &[u8]) -> Result<BackupArchive> {
    let mut json: Vec<u8> = Vec::new();
    GzDecoder::new(bytes)
        .read_to_end(&mut json)
        .context("Backup file is not valid gzip")?;
    serde_json::from_slice(&json).context("Backup file does not contain a valid snapshot")
}

/// `backup_<yyyymmdd_hhmmss>_<type>_<first 8 chars of id>.json.gz`
pub fn backup_file_name(created_at: DateTime<Utc>, backup_type: BackupType, id: &str) -> String {
    let short_id: String = id.chars().take(8).collect();
    format!(
        "backup_{}_{}_{}.json.gz",
        created_at.format("%Y%m%d_%H%M%S"),
        backup_type,
        short_id
    )
}

/// Which sections of an archive a restore applies. `restore_options.services`
/// may narrow it to a list of `vectors`, `personalization`, `scheduler`.
fn restore_wanted(options: &serde_json::Map<String, Value>, section: &str) -> bool {
    match options.get("services").and_then(Value::as_array) {
        Some(services) => services.iter().any(|s| s.as_str() == Some(section)),
        None => true,
    }
}

pub struct BackupService {
    storage_dir: PathBuf,
    backup_dir: PathBuf,
    vector: Arc<VectorService>,
    personalization: Arc<PersonalizationService>,
    scheduler: Arc<SchedulerService>,
    jobs: RwLock<BTreeMap<String, BackupJob>>,
    restores: RwLock<BTreeMap<String, RestoreJob>>,
}

impl BackupService {
    /// Creates `<storage_dir>/backups` if needed.
    pub fn new(
        storage_dir: impl Into<PathBuf>,
        vector: Arc<VectorService>,
        personalization: Arc<PersonalizationService>,
        scheduler: Arc<SchedulerService>,
    ) -> Result<Self> {
        let storage_dir: PathBuf = storage_dir.into();
        let backup_dir: PathBuf = storage_dir.join(BACKUP_DIR_NAME);
        std::fs::create_dir_all(&backup_dir)
            .with_context(|| format!("Failed to create backup directory {}", backup_dir.display()))?;

        info!("BackupService initialized. Backup directory: {}", backup_dir.display());
        Ok(Self {
            storage_dir,
            backup_dir,
            vector,
            personalization,
            scheduler,
            jobs: RwLock::new(BTreeMap::new()),
            restores: RwLock::new(BTreeMap::new()),
        })
    }

    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    /// Returns the pending job; the snapshot is written in the background.
    pub async fn create_backup(self: &Arc<Self>, create: BackupJobCreate) -> Result<BackupJob, ServiceError> {
        let now: DateTime<Utc> = Utc::now();
        let job: BackupJob = BackupJob {
            id: Uuid::new_v4().to_string(),
            backup_type: create.backup_type,
            description: create.description,
            status: BackupJobStatus::Pending,
            created_at: now,
            updated_at: now,
            started_at: None,
            completed_at: None,
            duration_seconds: None,
            file_path: None,
            file_size_bytes: None,
            error_message: None,
        };

        self.jobs.write().await.insert(job.id.clone(), job.clone());
        info!("Backup job {} created for type: {}", job.id, job.backup_type);

        let service: Arc<BackupService> = Arc::clone(self);
        let job_id: String = job.id.clone();
        tokio::spawn(async move {
            service.run_backup(&job_id).await;
        });

        Ok(job)
    }

    async fn run_backup(&self, job_id: &str) {
        let started: DateTime<Utc> = Utc::now();
        let Some(job) = self.mark_backup(job_id, |job| {
            job.status = BackupJobStatus::Running;
            job.started_at = Some(started);
            job.updated_at = started;
        })
        .await
        else {
            return;
        };

        let outcome: Result<(String, u64)> = self.write_snapshot(&job).await;
        let completed: DateTime<Utc> = Utc::now();

        self.mark_backup(job_id, |job| {
            job.completed_at = Some(completed);
            job.updated_at = completed;
            job.duration_seconds = Some((completed - started).num_milliseconds() as f64 / 1000.0);
            match outcome {
                Ok((file_path, size)) => {
                    info!("Backup job {} completed successfully. Path: {file_path}", job.id);
                    job.status = BackupJobStatus::Completed;
                    job.file_path = Some(file_path);
                    job.file_size_bytes = Some(size);
                }
                Err(err) => {
                    error!("Backup job {} failed: {err:#}", job.id);
                    job.status = BackupJobStatus::Failed;
                    job.error_message = Some(format!("{err:#}"));
                }
            }
        })
        .await;
    }

    async fn mark_backup(&self, job_id: &str, apply: impl FnOnce(&mut BackupJob)) -> Option<BackupJob> {
        let mut jobs = self.jobs.write().await;
        let job: &mut BackupJob = jobs.get_mut(job_id)?;
        apply(job);
        Some(job.clone())
    }

    async fn write_snapshot(&self, job: &BackupJob) -> Result<(String, u64)> {
        let archive: BackupArchive = BackupArchive {
            format_version: ARCHIVE_FORMAT_VERSION,
            backup_id: job.id.clone(),
            backup_type: job.backup_type,
            created_at: job.created_at,
            vectors: match job.backup_type.includes_vectors() {
                true => Some(self.vector.snapshot().await),
                false => None,
            },
            personalization: match job.backup_type.includes_personalization() {
                true => Some(self.personalization.snapshot().await),
                false => None,
            },
            scheduler: match job.backup_type.includes_scheduler() {
                true => Some(self.scheduler.snapshot().await),
                false => None,
            },
        };

        let bytes: Vec<u8> = encode_archive(&archive)?;
        let file_name: String = backup_file_name(job.created_at, job.backup_type, &job.id);
        let full_path: PathBuf = self.backup_dir.join(&file_name);

        tokio::fs::write(&full_path, &bytes)
            .await
            .with_context(|| format!("Failed to write {}", full_path.display()))?;

        let relative: String = Path::new(BACKUP_DIR_NAME).join(file_name).to_string_lossy().into_owned();
        Ok((relative, bytes.len() as u64))
    }

    /// Newest first.
    pub async fn list_backups(
        &self,
        status: Option<BackupJobStatus>,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<BackupJob>, ServiceError> {
        if limit == 0 || limit > MAX_LIST_LIMIT {
            return Err(ServiceError::InvalidInput(format!("limit must be between 1 and {MAX_LIST_LIMIT}")));
        }

        let mut jobs: Vec<BackupJob> = self
            .jobs
            .read()
            .await
            .values()
            .filter(|job| status.is_none_or(|s| job.status == s))
            .cloned()
            .collect();
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(paginate(jobs, offset, clamp_limit(limit, MAX_LIST_LIMIT)))
    }

    pub async fn get_backup(&self, job_id: &str) -> Result<BackupJob, ServiceError> {
        self.jobs
            .read()
            .await
            .get(job_id)
            .cloned()
            .ok_or_else(|| ServiceError::NotFound(format!("Backup job with ID {job_id} not found")))
    }

    /// Removes the record and its file. A missing file only warns.
    pub async fn delete_backup(&self, job_id: &str) -> Result<(), ServiceError> {
        let job: BackupJob = self
            .jobs
            .write()
            .await
            .remove(job_id)
            .ok_or_else(|| ServiceError::NotFound(format!("Backup job with ID {job_id} not found")))?;

        if let Some(file_path) = &job.file_path {
            let full_path: PathBuf = self.storage_dir.join(file_path);
            match tokio::fs::remove_file(&full_path).await {
                Ok(()) => info!("Deleted backup file: {}", full_path.display()),
                Err(err) => warn!("Could not delete backup file {}: {err}", full_path.display()),
            }
        }

        info!("Deleted backup job record {job_id}");
        Ok(())
    }

    /// File name and gzip bytes of a completed backup.
    pub async fn download(&self, job_id: &str) -> Result<(String, Vec<u8>), ServiceError> {
        let job: BackupJob = self.get_backup(job_id).await?;
        if job.status != BackupJobStatus::Completed {
            return Err(ServiceError::InvalidInput(format!(
                "Backup job {job_id} is not completed and cannot be downloaded"
            )));
        }
        let file_path: String = job
            .file_path
            .ok_or_else(|| ServiceError::NotFound(format!("Backup job {job_id} has no file")))?;

        let full_path: PathBuf = self.storage_dir.join(&file_path);
        let bytes: Vec<u8> = tokio::fs::read(&full_path)
            .await
            .map_err(|_| ServiceError::NotFound(format!("Backup file for job {job_id} not found")))?;

        let file_name: String = full_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("{job_id}.json.gz"));
        Ok((file_name, bytes))
    }

    pub async fn restore_from_backup(self: &Arc<Self>, create: RestoreJobCreate) -> Result<RestoreJob, ServiceError> {
        let source: BackupJob = self.jobs.read().await.get(&create.source_backup_id).cloned().ok_or_else(|| {
            ServiceError::InvalidInput(format!("Source backup job ID '{}' not found.", create.source_backup_id))
        })?;
        if source.status != BackupJobStatus::Completed {
            return Err(ServiceError::InvalidInput(format!(
                "Source backup job '{}' is not completed. Cannot restore.",
                source.id
            )));
        }
        let Some(file_path) = source.file_path else {
            return Err(ServiceError::InvalidInput(format!(
                "Source backup job '{}' has no associated file path.",
                source.id
            )));
        };

        let now: DateTime<Utc> = Utc::now();
        let job: RestoreJob = RestoreJob {
            id: Uuid::new_v4().to_string(),
            source_backup_id: create.source_backup_id,
            restore_options: create.restore_options,
            status: RestoreJobStatus::Pending,
            created_at: now,
            updated_at: now,
            started_at: None,
            completed_at: None,
            duration_seconds: None,
            error_message: None,
        };

        self.restores.write().await.insert(job.id.clone(), job.clone());
        info!("Restore job {} created from backup {}", job.id, job.source_backup_id);

        let service: Arc<BackupService> = Arc::clone(self);
        let restore_id: String = job.id.clone();
        let full_path: PathBuf = self.storage_dir.join(file_path);
        tokio::spawn(async move {
            service.run_restore(&restore_id, &full_path).await;
        });

        Ok(job)
    }

    async fn run_restore(&self, restore_id: &str, path: &Path) {
        let started: DateTime<Utc> = Utc::now();
        let options = {
            let mut restores = self.restores.write().await;
            let Some(job) = restores.get_mut(restore_id) else {
                return;
            };
            job.status = RestoreJobStatus::Running;
            job.started_at = Some(started);
            job.updated_at = started;
            job.restore_options.clone()
        };

        let outcome: Result<()> = async {
            let bytes: Vec<u8> = tokio::fs::read(path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let archive: BackupArchive = decode_archive(&bytes)?;

            if let Some(vectors) = archive.vectors.filter(|_| restore_wanted(&options, "vectors")) {
                self.vector.restore(vectors).await;
            }
            if let Some(profiles) = archive.personalization.filter(|_| restore_wanted(&options, "personalization")) {
                self.personalization.restore(profiles).await;
            }
            if let Some(jobs) = archive.scheduler.filter(|_| restore_wanted(&options, "scheduler")) {
                self.scheduler.restore(jobs).await;
            }
            Ok(())
        }
        .await;

        let completed: DateTime<Utc> = Utc::now();
        let mut restores = self.restores.write().await;
        let Some(job) = restores.get_mut(restore_id) else {
            return;
        };
        job.completed_at = Some(completed);
        job.updated_at = completed;
        job.duration_seconds = Some((completed - started).num_milliseconds() as f64 / 1000.0);
        match outcome {
            Ok(()) => {
                info!("Restore job {restore_id} completed");
                job.status = RestoreJobStatus::Completed;
            }
            Err(err) => {
                error!("Restore job {restore_id} failed: {err:#}");
                job.status = RestoreJobStatus::Failed;
                job.error_message = Some(format!("{err:#}"));
            }
        }
    }

    pub async fn get_restore_job(&self, job_id: &str) -> Result<RestoreJob, ServiceError> {
        self.restores
            .read()
            .await
            .get(job_id)
            .cloned()
            .ok_or_else(|| ServiceError::NotFound(format!("Restore job with ID {job_id} not found")))
    }

    /// Newest first.
    pub async fn list_restore_jobs(&self, limit: usize, offset: usize) -> Result<Vec<RestoreJob>, ServiceError> {
        if limit == 0 || limit > MAX_LIST_LIMIT {
            return Err(ServiceError::InvalidInput(format!("limit must be between 1 and {MAX_LIST_LIMIT}")));
        }

        let mut jobs: Vec<RestoreJob> = self.restores.read().await.values().cloned().collect();
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(paginate(jobs, offset, limit))
    }

    pub async fn backup_count(&self) -> usize {
        self.jobs.read().await.len()
    }
}

// End of file: /src/services/backup.rs
