// Start of file: /src/models/search.rs

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::common::Metadata;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SearchResultType {
    #[default]
    Web,
    Image,
    Video,
    News,
    Document,
    Social,
    Product,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SearchIntent {
    Informational,
    Navigational,
    Transactional,
    Commercial,
    Local,
    Visual,
    News,
    #[default]
    Undefined,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SearchLocality {
    Global,
    Local,
    Regional,
    National,
    #[default]
    Undefined,
}

/// A query after analysis.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Query {
    pub text: String,
    #[serde(default)]
    pub intent: SearchIntent,
    #[serde(default)]
    pub locality: SearchLocality,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub query_id: Option<String>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub processed_text: Option<String>,
    #[serde(default)]
    pub parameters: Map<String, Value>,
    #[serde(default)]
    pub context: Map<String, Value>,
}

fn default_language() -> String {
    "en".to_owned()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub snippet: String,
    pub provider: String,
    /// Position in the provider's own ranking, starting at 1.
    pub rank: usize,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    #[serde(default)]
    pub content_type: SearchResultType,
    #[serde(default)]
    pub is_ad: bool,
    #[serde(default)]
    pub cached_url: Option<String>,
    #[serde(default)]
    pub attribution: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub dark_pattern_flags: BTreeSet<String>,
    #[serde(default)]
    pub result_id: Option<String>,
}

/// Either raw text or an already analysed query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum QueryInput {
    Text(String),
    Structured(Query),
}

impl QueryInput {
    pub fn text(&self) -> &str {
        match self {
            QueryInput::Text(text) => text,
            QueryInput::Structured(query) => &query.text,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: QueryInput,
    #[serde(default = "default_num_results")]
    pub num_results: usize,
    #[serde(default)]
    pub providers: Option<Vec<String>>,
    #[serde(default)]
    pub parameters: Map<String, Value>,
}

fn default_num_results() -> usize {
    10
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct BiasAnalysis {
    pub provider_bias: Map<String, Value>,
    pub commercial_bias: Map<String, Value>,
    pub source_bias: Map<String, Value>,
    pub dark_patterns: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchMetadata {
    #[serde(flatten)]
    pub base: Metadata,
    pub query_processing_time: f64,
    pub engine_selection_time: f64,
    pub engines_used: Vec<String>,
    pub result_counts: BTreeMap<String, usize>,
    pub aggregation_strategy: String,
    pub deduplication_stats: BTreeMap<String, usize>,
    pub bias_analysis: Option<BiasAnalysis>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResponse {
    pub results: Vec<SearchResult>,
    pub metadata: SearchMetadata,
    pub query: Query,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzeParams {
    pub query: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrendsParams {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default = "default_trend_limit")]
    pub limit: usize,
}

fn default_trend_limit() -> usize {
    10
}

// End of file: /src/models/search.rs
