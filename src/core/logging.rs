// Start of file: /src/core/logging.rs

// * Tracing setup: fmt output plus an in-memory ring buffer that the
// * monitoring endpoints read from.

use std::{
    collections::VecDeque,
    fmt,
    sync::{Arc, Mutex, MutexGuard},
};

use chrono::Utc;
use once_cell::sync::Lazy;
use serde_json::{Map, Value};
use tracing::{
    field::{Field, Visit},
    Event, Level, Subscriber,
};
use tracing_subscriber::{
    fmt::format::FmtSpan,
    layer::{Context, SubscriberExt},
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

use crate::models::monitoring::LogEntry;

/// Number of events kept in memory.
pub const LOG_BUFFER_CAPACITY: usize = 1000;

static GLOBAL_BUFFER: Lazy<LogBuffer> = Lazy::new(|| LogBuffer::new(LOG_BUFFER_CAPACITY));

/// Bounded, shared store of recent log events. Oldest entries drop first.
#[derive(Clone)]
pub struct LogBuffer {
    entries: Arc<Mutex<VecDeque<LogEntry>>>,
    capacity: usize,
}

impl LogBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity: capacity.max(1),
        }
    }

    /// The buffer fed by the process-wide subscriber.
    pub fn global() -> LogBuffer {
        GLOBAL_BUFFER.clone()
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<LogEntry>> {
        // A panic while holding the lock leaves the deque intact
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn push(&self, entry: LogEntry) {
        let mut entries: MutexGuard<'_, VecDeque<LogEntry>> = self.lock();
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    /// Entries newest first.
    pub fn snapshot(&self) -> Vec<LogEntry> {
        self.lock().iter().rev().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn layer(&self) -> LogBufferLayer {
        LogBufferLayer { buffer: self.clone() }
    }
}

impl fmt::Debug for LogBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogBuffer")
            .field("len", &self.len())
            .field("capacity", &self.capacity)
            .finish()
    }
}

/// `tracing_subscriber` layer that copies each event into a `LogBuffer`.
pub struct LogBufferLayer {
    buffer: LogBuffer,
}

impl<S: Subscriber> Layer<S> for LogBufferLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let meta = event.metadata();
        let mut visitor: FieldVisitor = FieldVisitor::default();
        event.record(&mut visitor);

        let mut metadata: Map<String, Value> = visitor.fields;
        metadata.insert("target".to_owned(), Value::String(meta.target().to_owned()));
        let request_id: Option<String> = metadata
            .remove("request_id")
            .and_then(|v| v.as_str().map(str::to_owned));

        self.buffer.push(LogEntry {
            timestamp: Utc::now(),
            level: level_name(meta.level()).to_owned(),
            service: service_from_target(meta.target()),
            message: visitor.message,
            request_id,
            metadata,
        });
    }
}

#[derive(Default)]
struct FieldVisitor {
    message: String,
    fields: Map<String, Value>,
}

impl Visit for FieldVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_owned();
        } else {
            self.fields.insert(field.name().to_owned(), Value::String(value.to_owned()));
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.fields.insert(field.name().to_owned(), Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.fields.insert(field.name().to_owned(), Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.fields.insert(field.name().to_owned(), Value::from(value));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        let rendered: String = format!("{value:?}");
        if field.name() == "message" {
            self.message = rendered;
        } else {
            self.fields.insert(field.name().to_owned(), Value::String(rendered));
        }
    }
}

/// Uppercase level names as reported by `/monitor/logs`.
pub fn level_name(level: &Level) -> &'static str {
    match *level {
        Level::TRACE => "TRACE",
        Level::DEBUG => "DEBUG",
        Level::INFO => "INFO",
        Level::WARN => "WARNING",
        Level::ERROR => "ERROR",
    }
}

/// Normalizes a user supplied level name onto the names above.
pub fn normalize_level(raw: &str) -> String {
    match raw.trim().to_ascii_uppercase().as_str() {
        "WARN" => "WARNING".to_owned(),
        "SUCCESS" => "INFO".to_owned(),
        "CRITICAL" => "ERROR".to_owned(),
        other => other.to_owned(),
    }
}

/// `llamasearch::services::search::providers` -> `search`.
pub fn service_from_target(target: &str) -> String {
    let segments: Vec<&str> = target.split("::").collect();

    match segments.as_slice() {
        ["llamasearch", "services" | "api", name, ..] => match *name {
            "notifications" => "notification".to_owned(),
            "monitor" => "monitoring".to_owned(),
            "middleware" | "system" => "api".to_owned(),
            other => other.to_owned(),
        },
        _ => "api".to_owned(),
    }
}

/// Installs the global subscriber. `RUST_LOG` wins over `default_level`.
/// Returns false when a subscriber was already installed.
pub fn init_tracing(default_level: &str, debug: bool) -> bool {
    let env_filter: EnvFilter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "llamasearch={default_level},tower_http={default_level},axum={default_level}"
        ))
    });

    let span_events: FmtSpan = if debug { FmtSpan::FULL } else { FmtSpan::NONE };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_span_events(span_events))
        .with(LogBuffer::global().layer())
        .try_init()
        .is_ok()
}

// End of file: /src/core/logging.rs
