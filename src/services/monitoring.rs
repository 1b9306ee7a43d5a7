// Start of file: /src/services/monitoring.rs

// * Host metrics, request counters, per-service status and log queries.

use std::{
    collections::BTreeMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex,
    },
    time::{Duration, Instant},
};

use chrono::Utc;
use serde_json::{json, Map, Value};
use sysinfo::{Disks, System};
use tracing::debug;

use crate::config::environment::EnvironmentVariables;
use crate::core::logging::{normalize_level, LogBuffer};
use crate::models::common::{Metadata, API_VERSION};
use crate::models::monitoring::{LogEntry, LogQuery, MonitoringMetadata, ServiceStatus, SystemMetrics};
use crate::services::notification::NotificationService;
use crate::services::personalization::PersonalizationService;
use crate::services::scheduler::SchedulerService;
use crate::services::search::SearchService;
use crate::services::vector::VectorService;
use crate::utils::error_handler::ServiceError;

pub const MAX_LOG_LIMIT: usize = 1000;

/// Counters fed by the request metrics middleware.
#[derive(Debug)]
pub struct RequestMetrics {
    started: Instant,
    total: AtomicU64,
    errors: AtomicU64,
    latency_micros: AtomicU64,
}

impl Default for RequestMetrics {
    fn default() -> Self {
        Self {
            started: Instant::now(),
            total: AtomicU64::new(0),
            errors: AtomicU64::new(0),
            latency_micros: AtomicU64::new(0),
        }
    }
}

impl RequestMetrics {
    /// Responses with a 5xx status count as errors.
    pub fn record(&self, status: u16, latency: Duration) {
        self.total.fetch_add(1, Ordering::Relaxed);
        if status >= 500 {
            self.errors.fetch_add(1, Ordering::Relaxed);
        }
        let micros: u64 = u64::try_from(latency.as_micros()).unwrap_or(u64::MAX);
        self.latency_micros.fetch_add(micros, Ordering::Relaxed);
    }

    pub fn total(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }

    pub fn error_rate_percent(&self) -> f64 {
        match self.total() {
            0 => 0.0,
            total => self.errors.load(Ordering::Relaxed) as f64 * 100.0 / total as f64,
        }
    }

    pub fn avg_latency_ms(&self) -> f64 {
        match self.total() {
            0 => 0.0,
            total => self.latency_micros.load(Ordering::Relaxed) as f64 / 1000.0 / total as f64,
        }
    }

    pub fn requests_per_second(&self) -> f64 {
        let elapsed: f64 = self.started.elapsed().as_secs_f64();
        if elapsed <= 0.0 {
            return 0.0;
        }
        self.total() as f64 / elapsed
    }
}

/// Services whose health the status endpoint reports.
pub struct MonitoredServices {
    pub search: Arc<SearchService>,
    pub vector: Arc<VectorService>,
    pub personalization: Arc<PersonalizationService>,
    pub scheduler: Arc<SchedulerService>,
    pub notifications: Arc<NotificationService>,
}

pub struct MonitoringService {
    environment: Arc<EnvironmentVariables>,
    services: MonitoredServices,
    requests: RequestMetrics,
    logs: LogBuffer,
    system: Mutex<System>,
    started: Instant,
}

impl MonitoringService {
    pub fn new(environment: Arc<EnvironmentVariables>, services: MonitoredServices, logs: LogBuffer) -> Self {
        Self {
            environment,
            services,
            requests: RequestMetrics::default(),
            logs,
            system: Mutex::new(System::new()),
            started: Instant::now(),
        }
    }

    pub fn requests(&self) -> &RequestMetrics {
        &self.requests
    }

    pub fn uptime_seconds(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }

    fn host_metrics(&self) -> BTreeMap<String, f64> {
        let mut metrics: BTreeMap<String, f64> = BTreeMap::new();
        let mut system = self.system.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        // CPU usage is a delta between refreshes, so the first reading is 0
        system.refresh_cpu_all();
        system.refresh_memory();
        metrics.insert("cpu_usage_percent".to_owned(), f64::from(system.global_cpu_usage()));

        let total_memory: u64 = system.total_memory();
        let used_memory: u64 = system.used_memory();
        metrics.insert("memory_total_mb".to_owned(), total_memory as f64 / 1_048_576.0);
        metrics.insert("memory_used_mb".to_owned(), used_memory as f64 / 1_048_576.0);
        metrics.insert("memory_usage_percent".to_owned(), percent(used_memory, total_memory));
        drop(system);

        let disks: Disks = Disks::new_with_refreshed_list();
        let (total, available) = disks
            .list()
            .iter()
            .fold((0u64, 0u64), |(t, a), d| (t + d.total_space(), a + d.available_space()));
        metrics.insert("disk_usage_percent".to_owned(), percent(total.saturating_sub(available), total));

        metrics
    }

    pub async fn get_system_metrics(&self) -> SystemMetrics {
        let started: Instant = Instant::now();
        let mut metrics: BTreeMap<String, f64> = self.host_metrics();

        metrics.insert("request_count".to_owned(), self.requests.total() as f64);
        metrics.insert("error_rate_percent".to_owned(), self.requests.error_rate_percent());
        metrics.insert("avg_latency_ms".to_owned(), self.requests.avg_latency_ms());
        metrics.insert("requests_per_second".to_owned(), self.requests.requests_per_second());
        metrics.insert("uptime_seconds".to_owned(), self.uptime_seconds());
        metrics.insert("vector_count".to_owned(), self.services.vector.vector_count().await as f64);
        metrics.insert("scheduled_jobs".to_owned(), self.services.scheduler.job_count().await as f64);

        debug!("Collected {} metrics", metrics.len());
        SystemMetrics {
            metrics,
            metadata: MonitoringMetadata {
                base: Metadata::since(started),
                metrics_source: "sysinfo".to_owned(),
                last_updated: Utc::now(),
            },
        }
    }

    async fn all_statuses(&self) -> BTreeMap<String, ServiceStatus> {
        let env: &EnvironmentVariables = &self.environment;
        let providers: Vec<String> = self.services.search.provider_names();
        let mut statuses: BTreeMap<String, ServiceStatus> = BTreeMap::new();

        let hostname: String = hostname::get()
            .map(|h| h.to_string_lossy().into_owned())
            .unwrap_or_else(|_| "unknown".to_owned());
        statuses.insert(
            "api".to_owned(),
            ServiceStatus {
                status: "ok".to_owned(),
                uptime: Some(self.uptime_seconds()),
                version: Some(API_VERSION.to_owned()),
                details: object(json!({ "host": env.host, "port": env.port, "hostname": hostname })),
            },
        );

        for provider in ["google", "bing"] {
            let configured: bool = providers.iter().any(|p| p == provider);
            statuses.insert(
                format!("search_provider_{provider}"),
                ServiceStatus {
                    status: enabled_status(configured),
                    uptime: None,
                    version: None,
                    details: object(json!({
                        "reason": if configured { "API key configured" } else { "No API key" }
                    })),
                },
            );
        }

        let collections: usize = self.services.vector.list_collections().await.total_count;
        statuses.insert(
            "vector_database".to_owned(),
            ServiceStatus {
                status: enabled_status(env.feature_enabled("vector")),
                uptime: None,
                version: None,
                details: object(json!({
                    "type": env.vector_db_type,
                    "backend": "in_memory",
                    "url_configured": env.vector_db_url.is_some(),
                    "collections": collections,
                    "vectors": self.services.vector.vector_count().await,
                })),
            },
        );

        statuses.insert(
            "personalization".to_owned(),
            ServiceStatus {
                status: enabled_status(self.services.personalization.is_enabled()),
                uptime: None,
                version: None,
                details: object(json!({
                    "enabled": self.services.personalization.is_enabled(),
                    "privacy_level": env.privacy_level,
                    "profiles": self.services.personalization.profile_count().await,
                })),
            },
        );

        statuses.insert(
            "redis_cache".to_owned(),
            ServiceStatus {
                status: enabled_status(env.redis_url.is_some()),
                uptime: None,
                version: None,
                details: object(json!({ "configured": env.redis_url.is_some() })),
            },
        );

        let scheduler_status: String = match (env.feature_enabled("scheduler"), self.services.scheduler.is_running()) {
            (false, _) => "disabled".to_owned(),
            (true, true) => "ok".to_owned(),
            (true, false) => "degraded".to_owned(),
        };
        statuses.insert(
            "task_scheduler".to_owned(),
            ServiceStatus {
                status: scheduler_status,
                uptime: None,
                version: None,
                details: object(json!({
                    "running": self.services.scheduler.is_running(),
                    "jobs": self.services.scheduler.job_count().await,
                    "tasks": self.services.scheduler.registry().names(),
                })),
            },
        );

        statuses.insert(
            "notification_service".to_owned(),
            ServiceStatus {
                status: enabled_status(env.feature_enabled("notifications")),
                uptime: None,
                version: None,
                details: object(json!({ "sent": self.services.notifications.history_len().await })),
            },
        );

        statuses
    }

    /// All statuses, or only `name`'s.
    pub async fn get_service_status(&self, name: Option<&str>) -> Result<BTreeMap<String, ServiceStatus>, ServiceError> {
        let mut all: BTreeMap<String, ServiceStatus> = self.all_statuses().await;

        match name {
            None => Ok(all),
            Some(name) => match all.remove(name) {
                Some(status) => Ok(BTreeMap::from([(name.to_owned(), status)])),
                None => Err(ServiceError::NotFound(format!("Service '{name}' not found."))),
            },
        }
    }

    /// Newest first.
    pub fn get_logs(&self, query: &LogQuery) -> Result<Vec<LogEntry>, ServiceError> {
        if query.limit == 0 || query.limit > MAX_LOG_LIMIT {
            return Err(ServiceError::InvalidInput(format!("limit must be between 1 and {MAX_LOG_LIMIT}")));
        }

        Ok(filter_logs(self.logs.snapshot(), query))
    }
}

pub fn filter_logs(entries: Vec<LogEntry>, query: &LogQuery) -> Vec<LogEntry> {
    let level: Option<String> = query.level.as_deref().map(normalize_level);
    let keyword: Option<String> = query.keyword.as_deref().map(str::to_lowercase);

    entries
        .into_iter()
        .filter(|e| level.as_ref().is_none_or(|l| &e.level == l))
        .filter(|e| query.service.as_ref().is_none_or(|s| &e.service == s))
        .filter(|e| keyword.as_ref().is_none_or(|k| e.message.to_lowercase().contains(k.as_str())))
        .filter(|e| query.start_time.is_none_or(|t| e.timestamp >= t))
        .filter(|e| query.end_time.is_none_or(|t| e.timestamp <= t))
        .take(query.limit)
        .collect()
}

fn percent(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 * 100.0 / total as f64
    }
}

fn enabled_status(enabled: bool) -> String {
    let status: &str = if enabled { "ok" } else { "disabled" };
    status.to_owned()
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

// End of file: /src/services/monitoring.rs

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration as ChronoDuration};

    fn entry(level: &str, service: &str, message: &str, at: DateTime<Utc>) -> LogEntry {
        LogEntry {
            timestamp: at,
            level: level.into(),
            service: service.into(),
            message: message.into(),
            request_id: None,
            metadata: Map::new(),
        }
    }

    #[test]
    fn request_counters() {
        let metrics: RequestMetrics = RequestMetrics::default();
        metrics.record(200, Duration::from_millis(10));
        metrics.record(503, Duration::from_millis(30));
        metrics.record(404, Duration::from_millis(20));

        assert_eq!(metrics.total(), 3);
        assert!((metrics.error_rate_percent() - 100.0 / 3.0).abs() < 1e-9);
        assert!((metrics.avg_latency_ms() - 20.0).abs() < 1e-9);
    }

    #[test]
    fn log_filters_combine() {
        let now: DateTime<Utc> = Utc::now();
        let entries: Vec<LogEntry> = vec![
            entry("ERROR", "search", "Provider bing timed out", now),
            entry("INFO", "search", "Search completed", now - ChronoDuration::minutes(1)),
            entry("WARNING", "vector", "Slow query", now - ChronoDuration::hours(2)),
        ];

        let query: LogQuery = LogQuery { level: Some("warn".into()), limit: 10, ..LogQuery::default() };
        assert_eq!(filter_logs(entries.clone(), &query).len(), 1);

        let query: LogQuery = LogQuery { service: Some("search".into()), keyword: Some("BING".into()), limit: 10, ..LogQuery::default() };
        let found: Vec<LogEntry> = filter_logs(entries.clone(), &query);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].level, "ERROR");

        let query: LogQuery = LogQuery { start_time: Some(now - ChronoDuration::minutes(5)), limit: 1, ..LogQuery::default() };
        assert_eq!(filter_logs(entries, &query).len(), 1);
    }
}
