// Start of file: /src/config/state.rs

// * Application state: configuration plus one shared instance of every service.

use std::{
    sync::Arc,
    time::Instant,
};

use anyhow::{anyhow, Context, Result};
use once_cell::sync::Lazy;
use tracing::{info, warn};

use crate::config::environment::EnvironmentVariables;
use crate::core::logging::LogBuffer;
use crate::database::RedisService;
use crate::services::{
    monitoring::MonitoredServices,
    scheduler::tasks::{backup_task, notify_task},
    scheduler::TaskRegistry,
    BackupService, MonitoringService, NotificationService, PersonalizationService, SchedulerService,
    SearchService, VectorService,
};

#[derive(Clone)]
pub struct AppState {
    pub environment: Arc<EnvironmentVariables>,
    pub search: Arc<SearchService>,
    pub vector: Arc<VectorService>,
    pub personalization: Arc<PersonalizationService>,
    pub scheduler: Arc<SchedulerService>,
    pub backup: Arc<BackupService>,
    pub monitoring: Arc<MonitoringService>,
    pub notifications: Arc<NotificationService>,
    pub started_at: Instant,
}

impl AppState {
    /// Wires every service from configuration. Search providers come from
    /// the configured API keys.
    pub fn new(environment: Arc<EnvironmentVariables>) -> Result<Self> {
        let redis: Option<RedisService> = match &environment.redis_url {
            Some(url) => match RedisService::new(url) {
                Ok(redis) => Some(redis),
                Err(err) => {
                    warn!("Redis cache disabled: {err:#}");
                    None
                }
            },
            None => None,
        };

        let search: SearchService = SearchService::new(&environment, redis);
        Self::with_search(environment, search)
    }

    /// Same as `new` with a prepared search service.
    pub fn with_search(environment: Arc<EnvironmentVariables>, search: SearchService) -> Result<Self> {
        std::fs::create_dir_all(&environment.storage_dir).with_context(|| {
            format!("Failed to create storage directory {}", environment.storage_dir.display())
        })?;

        let search: Arc<SearchService> = Arc::new(search);
        let vector: Arc<VectorService> = Arc::new(VectorService::new(environment.default_model.clone()));
        let personalization: Arc<PersonalizationService> = Arc::new(PersonalizationService::new(
            environment.personalization_enabled,
            environment.privacy_level,
        ));
        let notifications: Arc<NotificationService> = Arc::new(NotificationService::new());

        let registry: TaskRegistry = TaskRegistry::with_defaults();
        let scheduler: Arc<SchedulerService> = Arc::new(SchedulerService::new(registry.clone()));

        let backup: Arc<BackupService> = Arc::new(BackupService::new(
            environment.storage_dir.clone(),
            vector.clone(),
            personalization.clone(),
            scheduler.clone(),
        )?);

        // * Tasks that reach into other services are registered once those exist
        registry.register("backup", backup_task(Arc::downgrade(&backup)));
        registry.register("notify", notify_task(notifications.clone()));

        let monitoring: Arc<MonitoringService> = Arc::new(MonitoringService::new(
            environment.clone(),
            MonitoredServices {
                search: search.clone(),
                vector: vector.clone(),
                personalization: personalization.clone(),
                scheduler: scheduler.clone(),
                notifications: notifications.clone(),
            },
            LogBuffer::global(),
        ));

        info!("Application state initialized (tasks: {:?})", registry.names());

        Ok(Self {
            environment,
            search,
            vector,
            personalization,
            scheduler,
            backup,
            monitoring,
            notifications,
            started_at: Instant::now(),
        })
    }

    /// Returns the process-wide instance built from `EnvironmentVariables::instance()`.
    pub fn instance() -> Result<&'static Self> {
        static INSTANCE: Lazy<Result<AppState, anyhow::Error>> = Lazy::new(|| {
            let environment: &'static EnvironmentVariables = EnvironmentVariables::instance()?;
            AppState::new(Arc::new(environment.clone()))
        });

        INSTANCE
            .as_ref()
            .map_err(|e| anyhow!("Failed to initialize AppState: {e:#}"))
    }

    pub fn uptime_seconds(&self) -> f64 {
        self.started_at.elapsed().as_secs_f64()
    }
}

// End of file: /src/config/state.rs
