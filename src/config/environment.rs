// Start of file: /src/config/environment.rs

// * Environment configuration with a lazily-initialized singleton.
// * Every key has a default; enumerated values degrade with a warning,
// * only unparsable numbers abort startup.

use std::{
    borrow::Cow,
    collections::{BTreeMap, HashMap},
    fmt,
    path::PathBuf,
};
// * anyhow for convenient error handling
use anyhow::{anyhow, Context, Result};
// * once_cell for lazy static initialization
use once_cell::sync::Lazy;
use serde::Serialize;

use crate::models::personalization::PrivacyLevel;

// ! Default values for environment variables (used if variables aren't set):
const DEFAULT_ENVIRONMENT: &str = "development";
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8000;
const DEFAULT_WORKERS: usize = 4;
const DEFAULT_LOG_LEVEL: &str = "INFO";
const DEFAULT_SECRET_KEY: &str = "super-secret-key-change-in-production";
const DEFAULT_API_KEY_HEADER: &str = "X-API-Key";
const DEFAULT_TOKEN_EXPIRE_MINUTES: u64 = 30;
const DEFAULT_DATABASE_URL: &str = "sqlite:///llamasearch.db";
const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
const DEFAULT_VECTOR_DB_TYPE: &str = "qdrant";
const DEFAULT_STORAGE_DIR: &str = "storage";
const DEFAULT_DASHBOARD_HOST: &str = "0.0.0.0";
const DEFAULT_DASHBOARD_PORT: u16 = 8050;
const DEFAULT_MAX_BODY_SIZE: usize = 2_097_152; // 2MB
const DEFAULT_TIMEOUT: u64 = 30; // 30 seconds
const DEFAULT_SCHEDULER_TICK: u64 = 10;

const LOG_LEVELS: [&str; 7] = ["TRACE", "DEBUG", "INFO", "SUCCESS", "WARNING", "ERROR", "CRITICAL"];
const VECTOR_DB_TYPES: [&str; 6] = ["qdrant", "milvus", "weaviate", "pinecone", "faiss", "elasticsearch"];

/// Feature flags and whether they are on by default.
pub const DEFAULT_FEATURES: [(&str, bool); 10] = [
    ("metasearch", true),
    ("vector", true),
    ("personalization", true),
    ("blockchain", false),
    ("voice", false),
    ("monitor", true),
    ("scheduler", true),
    ("notifications", true),
    ("backup", true),
    ("simulator", false),
];

// * All settings used by the app. Secrets are never serialized.
#[derive(Clone, Serialize)]
pub struct EnvironmentVariables {
    pub environment: Cow<'static, str>,
    pub host: Cow<'static, str>,
    pub port: u16,
    pub workers: usize,
    pub debug: bool,
    pub log_level: Cow<'static, str>,
    #[serde(skip)]
    pub secret_key: String,
    pub api_key_header: Cow<'static, str>,
    #[serde(skip)]
    pub api_keys: Vec<String>,
    pub access_token_expire_minutes: u64,
    pub allowed_hosts: Vec<String>,
    pub cors_origins: Vec<String>,
    pub database_url: String,
    pub redis_url: Option<String>,
    #[serde(skip)]
    pub openai_api_key: Option<String>,
    pub default_model: String,
    #[serde(skip)]
    pub google_api_key: Option<String>,
    pub google_cx: Option<String>,
    #[serde(skip)]
    pub bing_api_key: Option<String>,
    pub vector_db_url: Option<String>,
    pub vector_db_type: Cow<'static, str>,
    pub personalization_enabled: bool,
    pub privacy_level: PrivacyLevel,
    pub use_mlx: bool,
    pub storage_dir: PathBuf,
    pub dashboard_host: String,
    pub dashboard_port: u16,
    pub features: BTreeMap<String, bool>,
    pub max_request_body_size: usize,
    pub request_timeout_seconds: u64,
    pub scheduler_tick_seconds: u64,
    // * Problems found while loading; logged once tracing is up
    #[serde(skip)]
    pub warnings: Vec<String>,
}

impl EnvironmentVariables {
    // * Loads from the process environment.
    // * Only reads .env if ENVIRONMENT != "production".
    pub fn load() -> Result<Self> {
        // ? In non-production environments, attempt to load .env
        if std::env::var("ENVIRONMENT").unwrap_or_default() != "production" {
            dotenv::dotenv().ok();
        }

        let vars: HashMap<String, String> = std::env::vars().collect();
        Self::from_map(&vars)
    }

    /// Builds the configuration from an arbitrary key/value map.
    pub fn from_map(vars: &HashMap<String, String>) -> Result<Self> {
        let mut warnings: Vec<String> = Vec::new();

        // * A small helper closure to fetch a non-empty variable by key
        let get_var = |key: &str| {
            vars.get(key)
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
        };
        let owned = |key: &str| get_var(key).map(str::to_owned);

        let environment: Cow<'static, str> = get_var("ENVIRONMENT")
            .map(|s| Cow::Owned(s.into()))
            .unwrap_or(Cow::Borrowed(DEFAULT_ENVIRONMENT));

        let log_level: Cow<'static, str> = match get_var("LLAMASEARCH_LOG_LEVEL") {
            Some(raw) if LOG_LEVELS.contains(&raw.to_uppercase().as_str()) => {
                Cow::Owned(raw.to_uppercase())
            }
            Some(raw) => {
                warnings.push(format!("Invalid log level: {raw}. Defaulting to {DEFAULT_LOG_LEVEL}."));
                Cow::Borrowed(DEFAULT_LOG_LEVEL)
            }
            None => Cow::Borrowed(DEFAULT_LOG_LEVEL),
        };

        let privacy_level: PrivacyLevel = match get_var("LLAMASEARCH_PRIVACY_LEVEL") {
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                warnings.push(format!("Invalid privacy level: {raw}. Defaulting to high."));
                PrivacyLevel::High
            }),
            None => PrivacyLevel::High,
        };

        let vector_db_type: Cow<'static, str> = match get_var("LLAMASEARCH_VECTOR_DB_TYPE") {
            Some(raw) if VECTOR_DB_TYPES.contains(&raw.to_lowercase().as_str()) => {
                Cow::Owned(raw.to_lowercase())
            }
            Some(raw) => {
                warnings.push(format!("Invalid vector DB type: {raw}. Defaulting to {DEFAULT_VECTOR_DB_TYPE}."));
                Cow::Borrowed(DEFAULT_VECTOR_DB_TYPE)
            }
            None => Cow::Borrowed(DEFAULT_VECTOR_DB_TYPE),
        };

        let mut features: BTreeMap<String, bool> = DEFAULT_FEATURES
            .iter()
            .map(|(name, on)| (name.to_string(), *on))
            .collect();
        if let Some(raw) = get_var("LLAMASEARCH_FEATURES") {
            match serde_json::from_str::<BTreeMap<String, bool>>(raw) {
                Ok(overrides) => features.extend(overrides),
                Err(e) => warnings.push(format!("Invalid LLAMASEARCH_FEATURES ({e}); keeping defaults")),
            }
        }

        let secret_key: String = owned("LLAMASEARCH_SECRET_KEY").unwrap_or_else(|| DEFAULT_SECRET_KEY.to_owned());
        if secret_key == DEFAULT_SECRET_KEY && environment == "production" {
            warnings.push("LLAMASEARCH_SECRET_KEY is the default value in production".to_owned());
        }

        let debug: bool = parse_bool(get_var("LLAMASEARCH_DEBUG"), "LLAMASEARCH_DEBUG", false, &mut warnings);
        let personalization_enabled: bool = parse_bool(
            get_var("LLAMASEARCH_PERSONALIZATION_ENABLED"),
            "LLAMASEARCH_PERSONALIZATION_ENABLED",
            true,
            &mut warnings,
        );
        let use_mlx: bool = parse_bool(get_var("LLAMASEARCH_USE_MLX"), "LLAMASEARCH_USE_MLX", false, &mut warnings);

        let config: Self = Self {
            host: get_var("LLAMASEARCH_API_HOST")
                .map(|s| Cow::Owned(s.into()))
                .unwrap_or(Cow::Borrowed(DEFAULT_HOST)),

            port: get_var("LLAMASEARCH_API_PORT")
                .map(|s| s.parse().context("Invalid LLAMASEARCH_API_PORT value"))
                .transpose()?
                .unwrap_or(DEFAULT_PORT),

            workers: get_var("LLAMASEARCH_API_WORKERS")
                .map(|s| s.parse::<usize>().context("Invalid LLAMASEARCH_API_WORKERS value"))
                .transpose()?
                .unwrap_or(DEFAULT_WORKERS)
                .max(1),

            debug,

            log_level,
            secret_key,

            api_key_header: get_var("LLAMASEARCH_API_KEY_HEADER")
                .map(|s| Cow::Owned(s.into()))
                .unwrap_or(Cow::Borrowed(DEFAULT_API_KEY_HEADER)),

            api_keys: get_var("LLAMASEARCH_API_KEYS").map(parse_list).unwrap_or_default(),

            access_token_expire_minutes: get_var("LLAMASEARCH_ACCESS_TOKEN_EXPIRE_MINUTES")
                .map(|s| s.parse().context("Invalid LLAMASEARCH_ACCESS_TOKEN_EXPIRE_MINUTES"))
                .transpose()?
                .unwrap_or(DEFAULT_TOKEN_EXPIRE_MINUTES),

            allowed_hosts: get_var("LLAMASEARCH_ALLOWED_HOSTS")
                .map(parse_list)
                .unwrap_or_else(|| vec!["*".to_owned()]),

            cors_origins: get_var("LLAMASEARCH_CORS_ORIGINS")
                .map(parse_list)
                .unwrap_or_else(|| vec!["*".to_owned()]),

            database_url: owned("LLAMASEARCH_DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_owned()),
            redis_url: owned("LLAMASEARCH_REDIS_URL"),
            openai_api_key: owned("OPENAI_API_KEY"),
            default_model: owned("LLAMASEARCH_DEFAULT_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_owned()),
            google_api_key: owned("GOOGLE_API_KEY"),
            google_cx: owned("GOOGLE_CX"),
            bing_api_key: owned("BING_API_KEY"),
            vector_db_url: owned("LLAMASEARCH_VECTOR_DB_URL"),
            vector_db_type,

            personalization_enabled,

            privacy_level,

            use_mlx,

            storage_dir: get_var("LLAMASEARCH_STORAGE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STORAGE_DIR)),

            dashboard_host: owned("LLAMASEARCH_DASHBOARD_HOST").unwrap_or_else(|| DEFAULT_DASHBOARD_HOST.to_owned()),

            dashboard_port: get_var("LLAMASEARCH_DASHBOARD_PORT")
                .map(|s| s.parse().context("Invalid LLAMASEARCH_DASHBOARD_PORT value"))
                .transpose()?
                .unwrap_or(DEFAULT_DASHBOARD_PORT),

            features,

            max_request_body_size: get_var("LLAMASEARCH_MAX_REQUEST_BODY_SIZE")
                .map(|s| s.parse().context("Invalid LLAMASEARCH_MAX_REQUEST_BODY_SIZE"))
                .transpose()?
                .unwrap_or(DEFAULT_MAX_BODY_SIZE),

            request_timeout_seconds: get_var("LLAMASEARCH_REQUEST_TIMEOUT_SECONDS")
                .map(|s| s.parse().context("Invalid LLAMASEARCH_REQUEST_TIMEOUT_SECONDS"))
                .transpose()?
                .unwrap_or(DEFAULT_TIMEOUT),

            scheduler_tick_seconds: get_var("LLAMASEARCH_SCHEDULER_TICK_SECONDS")
                .map(|s| s.parse::<u64>().context("Invalid LLAMASEARCH_SCHEDULER_TICK_SECONDS"))
                .transpose()?
                .unwrap_or(DEFAULT_SCHEDULER_TICK)
                .max(1),

            environment,
            warnings,
        };

        Ok(config.with_cross_checks())
    }

    // * Warnings that depend on more than one setting
    fn with_cross_checks(mut self) -> Self {
        if self.feature_enabled("metasearch") && self.google_api_key.is_none() && self.bing_api_key.is_none() {
            self.warnings.push(
                "Metasearch is enabled but no search API keys are provided. \
                 Set GOOGLE_API_KEY, BING_API_KEY, or disable metasearch."
                    .to_owned(),
            );
        }

        if self.feature_enabled("personalization") && self.redis_url.is_none() {
            self.warnings.push(
                "Personalization is enabled but no Redis URL is provided. \
                 Some personalization features may be limited."
                    .to_owned(),
            );
        }

        self
    }

    // * Returns the lazily-initialized process configuration
    pub fn instance() -> Result<&'static Self> {
        static INSTANCE: Lazy<Result<EnvironmentVariables, anyhow::Error>> =
            Lazy::new(EnvironmentVariables::load);

        INSTANCE
            .as_ref()
            .map_err(|e| anyhow!("Failed to load environment configuration: {e:#}"))
    }

    /// Whether a named feature flag is on. Unknown flags are off.
    pub fn feature_enabled(&self, name: &str) -> bool {
        self.features.get(name).copied().unwrap_or(false)
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Settings without secrets, for logs and diagnostics.
    pub fn redacted(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    /// Maps the configured level onto a tracing filter directive.
    pub fn log_level_directive(&self) -> &'static str {
        match self.log_level.as_ref() {
            "TRACE" => "trace",
            "DEBUG" => "debug",
            "WARNING" => "warn",
            "ERROR" | "CRITICAL" => "error",
            // SUCCESS has no tracing equivalent
            _ => "info",
        }
    }

    pub fn search_configured(&self) -> bool {
        (self.google_api_key.is_some() && self.google_cx.is_some()) || self.bing_api_key.is_some()
    }
}

impl fmt::Debug for EnvironmentVariables {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EnvironmentVariables {}", self.redacted())
    }
}

/// Unrecognised values fall back to `default` with a warning.
fn parse_bool(raw: Option<&str>, key: &str, default: bool, warnings: &mut Vec<String>) -> bool {
    let Some(raw) = raw else {
        return default;
    };

    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => {
            warnings.push(format!("Invalid {key} value: {raw}. Defaulting to {default}."));
            default
        }
    }
}

// * Accepts a JSON array (`["a","b"]`) or a comma separated list
fn parse_list(raw: &str) -> Vec<String> {
    if raw.starts_with('[') {
        if let Ok(items) = serde_json::from_str::<Vec<String>>(raw) {
            return items;
        }
    }

    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}

// End of file: /src/config/environment.rs
