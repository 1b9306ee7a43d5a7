// Start of file: /src/services/scheduler/mod.rs

// * In-process job scheduler: one-off, interval and cron jobs executed by
// * named task handlers, with timeouts and retries.

pub mod cron;
pub mod tasks;

use std::{
    collections::BTreeMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use futures::future::join_all;
use serde_json::Value;
use tokio::{sync::{watch, RwLock}, task::JoinHandle, time::MissedTickBehavior};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::models::scheduler::{Job, JobCreate, JobStatus, JobUpdate, Schedule};
use crate::utils::error_handler::ServiceError;
use crate::utils::utils::{clamp_limit, paginate};

pub use cron::CronExpression;
pub use tasks::{TaskContext, TaskHandler, TaskRegistry};

pub const MAX_LIST_LIMIT: usize = 1000;

/// Checks that exactly one schedule form is set and that it is usable.
pub fn validate_schedule(schedule: &Schedule) -> Result<(), ServiceError> {
    let set: usize = [
        schedule.run_once_at.is_some(),
        schedule.interval_seconds.is_some(),
        schedule.cron_expression.is_some(),
    ]
    .iter()
    .filter(|s| **s)
    .count();

    if set != 1 {
        return Err(ServiceError::InvalidInput(
            "Schedule must set exactly one of run_once_at, interval_seconds or cron_expression".to_owned(),
        ));
    }
    if schedule.interval_seconds == Some(0) {
        return Err(ServiceError::InvalidInput("interval_seconds must be positive".to_owned()));
    }
    if let Some(expression) = &schedule.cron_expression {
        expression
            .parse::<CronExpression>()
            .map_err(|e| ServiceError::InvalidInput(format!("Invalid cron expression: {e}")))?;
    }

    Ok(())
}

/// Next run strictly after `now`. One-off jobs keep their instant even when
/// it has passed so they fire on the next tick.
pub fn next_run(schedule: &Schedule, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    if let Some(at) = schedule.run_once_at {
        return Some(at);
    }
    if let Some(seconds) = schedule.interval_seconds {
        return seconds_after(now, seconds);
    }
    schedule
        .cron_expression
        .as_deref()
        .and_then(|e| e.parse::<CronExpression>().ok())
        .and_then(|c| c.next_after(now))
}

fn seconds_after(from: DateTime<Utc>, seconds: u64) -> Option<DateTime<Utc>> {
    let seconds: i64 = i64::try_from(seconds).ok()?;
    from.checked_add_signed(ChronoDuration::try_seconds(seconds)?)
}

pub struct SchedulerService {
    jobs: RwLock<BTreeMap<String, Job>>,
    registry: TaskRegistry,
    running: AtomicBool,
    stop_tx: watch::Sender<bool>,
}

impl SchedulerService {
    pub fn new(registry: TaskRegistry) -> Self {
        let (stop_tx, _) = watch::channel(false);
        Self {
            jobs: RwLock::new(BTreeMap::new()),
            registry,
            running: AtomicBool::new(false),
            stop_tx,
        }
    }

    pub fn registry(&self) -> &TaskRegistry {
        &self.registry
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    #[instrument(skip(self, create), fields(task = %create.task_name))]
    pub async fn schedule_job(&self, create: JobCreate) -> Result<Job, ServiceError> {
        validate_schedule(&create.schedule)?;
        if !self.registry.contains(&create.task_name) {
            return Err(ServiceError::InvalidInput(format!(
                "Unknown task '{}'. Available tasks: {}",
                create.task_name,
                self.registry.names().join(", ")
            )));
        }

        let now: DateTime<Utc> = Utc::now();
        let job: Job = Job {
            id: Uuid::new_v4().to_string(),
            task_name: create.task_name,
            next_run_time: next_run(&create.schedule, now),
            schedule: create.schedule,
            args: create.args,
            kwargs: create.kwargs,
            status: JobStatus::Pending,
            created_at: now,
            updated_at: now,
            last_run_time: None,
            last_result: None,
            last_error: None,
            run_count: 0,
            timeout_seconds: create.timeout_seconds.max(1),
            max_retries: create.max_retries,
            retries_left: create.max_retries,
            retry_delay_seconds: create.retry_delay_seconds,
        };

        self.jobs.write().await.insert(job.id.clone(), job.clone());
        info!("Scheduled job {} ({}), next run {:?}", job.id, job.task_name, job.next_run_time);
        Ok(job)
    }

    pub async fn get_job(&self, job_id: &str) -> Result<Job, ServiceError> {
        self.jobs
            .read()
            .await
            .get(job_id)
            .cloned()
            .ok_or_else(|| ServiceError::NotFound(format!("Job with ID {job_id} not found")))
    }

    /// Newest first.
    pub async fn list_jobs(&self, status: Option<JobStatus>, limit: usize, offset: usize) -> Result<Vec<Job>, ServiceError> {
        if limit == 0 || limit > MAX_LIST_LIMIT {
            return Err(ServiceError::InvalidInput(format!("limit must be between 1 and {MAX_LIST_LIMIT}")));
        }

        let mut jobs: Vec<Job> = self
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

    pub async fn update_job(&self, job_id: &str, update: JobUpdate) -> Result<Job, ServiceError> {
        if let Some(schedule) = &update.schedule {
            validate_schedule(schedule)?;
        }
        // Running, completed and failed are owned by the executor
        if let Some(status) = update.status {
            if !matches!(status, JobStatus::Pending | JobStatus::Cancelled) {
                return Err(ServiceError::InvalidInput(format!(
                    "status can only be set to pending or cancelled, got {status:?}"
                )));
            }
        }
        if let Some(task_name) = &update.task_name {
            if !self.registry.contains(task_name) {
                return Err(ServiceError::InvalidInput(format!("Unknown task '{task_name}'")));
            }
        }

        let mut jobs = self.jobs.write().await;
        let job: &mut Job = jobs
            .get_mut(job_id)
            .ok_or_else(|| ServiceError::NotFound(format!("Job with ID {job_id} not found")))?;
        let now: DateTime<Utc> = Utc::now();

        if let Some(task_name) = update.task_name {
            job.task_name = task_name;
        }
        if let Some(args) = update.args {
            job.args = args;
        }
        if let Some(kwargs) = update.kwargs {
            job.kwargs = kwargs;
        }
        if let Some(timeout) = update.timeout_seconds {
            job.timeout_seconds = timeout.max(1);
        }
        if let Some(max_retries) = update.max_retries {
            job.max_retries = max_retries;
            job.retries_left = max_retries;
        }
        if let Some(delay) = update.retry_delay_seconds {
            job.retry_delay_seconds = delay;
        }
        if let Some(schedule) = update.schedule {
            job.next_run_time = next_run(&schedule, now);
            job.schedule = schedule;
        }
        if let Some(status) = update.status {
            job.status = status;
        }
        job.updated_at = now;

        info!("Updated job {job_id}");
        Ok(job.clone())
    }

    pub async fn delete_job(&self, job_id: &str) -> Result<(), ServiceError> {
        match self.jobs.write().await.remove(job_id) {
            Some(_) => {
                info!("Deleted job {job_id}");
                Ok(())
            }
            None => Err(ServiceError::NotFound(format!("Job with ID {job_id} not found"))),
        }
    }

    /// Runs a job now, in the background.
    pub async fn trigger_job(self: &Arc<Self>, job_id: &str) -> Result<Job, ServiceError> {
        let job: Job = self.get_job(job_id).await?;
        if job.status == JobStatus::Running {
            return Err(ServiceError::Conflict(format!("Job {job_id} is already running")));
        }

        info!("Manually triggering job {job_id}: {}", job.task_name);
        let scheduler: Arc<SchedulerService> = Arc::clone(self);
        let id: String = job.id.clone();
        tokio::spawn(async move {
            scheduler.execute(&id, Utc::now()).await;
        });

        Ok(job)
    }

    /// One loop tick: runs every pending job whose next run is due.
    /// Returns the number of jobs executed.
    pub async fn run_due_jobs(&self, now: DateTime<Utc>) -> usize {
        let due: Vec<String> = self
            .jobs
            .read()
            .await
            .values()
            .filter(|job| job.status == JobStatus::Pending && job.next_run_time.is_some_and(|t| t <= now))
            .map(|job| job.id.clone())
            .collect();

        if !due.is_empty() {
            debug!("{} job(s) due", due.len());
        }

        join_all(due.iter().map(|id| self.execute(id, now))).await;
        due.len()
    }

    async fn execute(&self, job_id: &str, now: DateTime<Utc>) {
        let claimed: Option<(String, TaskContext, u64)> = {
            let mut jobs = self.jobs.write().await;
            match jobs.get_mut(job_id) {
                Some(job) if job.status != JobStatus::Running => {
                    job.status = JobStatus::Running;
                    job.last_run_time = Some(now);
                    job.updated_at = Utc::now();
                    Some((
                        job.task_name.clone(),
                        TaskContext {
                            job_id: job.id.clone(),
                            args: job.args.clone(),
                            kwargs: job.kwargs.clone(),
                        },
                        job.timeout_seconds,
                    ))
                }
                _ => None,
            }
        };
        let Some((task_name, context, timeout_seconds)) = claimed else {
            return;
        };

        info!("Running job {job_id}: {task_name}");
        let outcome: Result<Value, String> = match self.registry.get(&task_name) {
            None => Err(format!("Unknown task '{task_name}'")),
            Some(handler) => match tokio::time::timeout(Duration::from_secs(timeout_seconds), handler(context)).await {
                Ok(Ok(value)) => Ok(value),
                Ok(Err(err)) => Err(format!("{err:#}")),
                Err(_) => Err(format!("Task timed out after {timeout_seconds}s")),
            },
        };

        let mut jobs = self.jobs.write().await;
        // Deleted while running
        let Some(job) = jobs.get_mut(job_id) else {
            return;
        };
        let finished: DateTime<Utc> = Utc::now();
        job.run_count += 1;
        job.updated_at = finished;

        match outcome {
            Ok(value) => {
                job.last_result = Some(value);
                job.last_error = None;
                job.retries_left = job.max_retries;

                if job.schedule.is_recurring() {
                    job.next_run_time = next_run(&job.schedule, finished);
                    job.status = if job.next_run_time.is_some() { JobStatus::Pending } else { JobStatus::Completed };
                } else {
                    job.next_run_time = None;
                    job.status = JobStatus::Completed;
                }
                info!("Job {job_id} completed");
            }
            Err(message) => {
                if job.retries_left > 0 {
                    job.retries_left -= 1;
                    job.status = JobStatus::Pending;
                    job.next_run_time = seconds_after(finished, job.retry_delay_seconds);
                    warn!("Job {job_id} failed, {} retries left: {message}", job.retries_left);
                } else {
                    job.status = JobStatus::Failed;
                    job.next_run_time = None;
                    error!("Job {job_id} failed: {message}");
                }
                job.last_error = Some(message);
            }
        }
    }

    /// Spawns the polling loop. A second call while running is a no-op.
    pub fn start(self: &Arc<Self>, tick: Duration) -> Option<JoinHandle<()>> {
        if self.running.swap(true, Ordering::SeqCst) {
            return None;
        }

        let scheduler: Arc<SchedulerService> = Arc::clone(self);
        let mut stop_rx: watch::Receiver<bool> = self.stop_tx.subscribe();

        Some(tokio::spawn(async move {
            info!("Scheduler loop started (tick {}s)", tick.as_secs_f64());
            let mut interval: tokio::time::Interval = tokio::time::interval(tick);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        scheduler.run_due_jobs(Utc::now()).await;
                    }
                    _ = stop_rx.changed() => break,
                }
            }

            scheduler.running.store(false, Ordering::SeqCst);
            info!("Scheduler loop stopped");
        }))
    }

    pub fn stop(&self) {
        if self.is_running() {
            self.stop_tx.send_replace(true);
        }
    }

    pub async fn job_count(&self) -> usize {
        self.jobs.read().await.len()
    }

    pub async fn snapshot(&self) -> BTreeMap<String, Job> {
        self.jobs.read().await.clone()
    }

    /// Restored jobs that were mid-run go back to pending.
    pub async fn restore(&self, snapshot: BTreeMap<String, Job>) {
        let count: usize = snapshot.len();
        let mut jobs = self.jobs.write().await;
        for (id, mut job) in snapshot {
            if job.status == JobStatus::Running {
                job.status = JobStatus::Pending;
            }
            jobs.insert(id, job);
        }
        info!("Restored {count} jobs");
    }
}

// End of file: /src/services/scheduler/mod.rs
