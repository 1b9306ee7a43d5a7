// Start of file: /src/models/common.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use uuid::Uuid;

/// Crate version, reported by `/health` and in every metadata block.
pub const API_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Source label attached to operation metadata.
pub const SOURCE: &str = "LlamaSearch AI";

/// Timing and identity for one processed request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Metadata {
    /// Milliseconds spent handling the operation.
    pub processing_time: f64,
    pub timestamp: DateTime<Utc>,
    pub request_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl Metadata {
    // * Builds metadata for an operation started at `started`
    pub fn since(started: Instant) -> Self {
        Self {
            processing_time: elapsed_ms(started),
            timestamp: Utc::now(),
            request_id: Uuid::new_v4().to_string(),
            source: Some(SOURCE.to_owned()),
            version: Some(API_VERSION.to_owned()),
        }
    }
}

pub fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}

/// `limit`/`offset` query parameters shared by list endpoints.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Page {
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
}

fn default_limit() -> usize {
    100
}

impl Default for Page {
    fn default() -> Self {
        Self { limit: default_limit(), offset: 0 }
    }
}

// End of file: /src/models/common.rs
