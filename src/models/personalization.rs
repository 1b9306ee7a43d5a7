// Start of file: /src/models/personalization.rs

use std::{collections::BTreeMap, fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::common::Metadata;

/// How much user data personalization may keep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PrivacyLevel {
    High,
    #[default]
    Medium,
    Low,
    None,
}

impl FromStr for PrivacyLevel {
    type Err = String;

    // "max" is accepted as an alias of "high"
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" | "max" => Ok(PrivacyLevel::High),
            "medium" => Ok(PrivacyLevel::Medium),
            "low" => Ok(PrivacyLevel::Low),
            "none" => Ok(PrivacyLevel::None),
            other => Err(format!("unknown privacy level: {other}")),
        }
    }
}

impl fmt::Display for PrivacyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name: &str = match self {
            PrivacyLevel::High => "high",
            PrivacyLevel::Medium => "medium",
            PrivacyLevel::Low => "low",
            PrivacyLevel::None => "none",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserPreference {
    pub key: String,
    pub value: Value,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

/// Body of `PUT /preferences/{user_id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct UserPreferenceUpdate {
    pub key: String,
    pub value: Value,
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchHistoryItem {
    pub query: String,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub results_clicked: Vec<String>,
    #[serde(default)]
    pub dwell_times: BTreeMap<String, f64>,
    #[serde(default)]
    pub device_info: BTreeMap<String, String>,
    #[serde(default)]
    pub location: Option<Map<String, Value>>,
}

impl SearchHistoryItem {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            timestamp: Utc::now(),
            results_clicked: Vec::new(),
            dwell_times: BTreeMap::new(),
            device_info: BTreeMap::new(),
            location: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    pub user_id: String,
    #[serde(default)]
    pub preferences: Map<String, Value>,
    #[serde(default)]
    pub topics_of_interest: Vec<String>,
    #[serde(default)]
    pub search_history: Vec<SearchHistoryItem>,
    #[serde(default)]
    pub embedding: Option<Vec<f32>>,
    #[serde(default)]
    pub privacy_level: PrivacyLevel,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl UserProfile {
    pub fn empty(user_id: impl Into<String>, privacy_level: PrivacyLevel) -> Self {
        let now: DateTime<Utc> = Utc::now();
        Self {
            user_id: user_id.into(),
            preferences: Map::new(),
            topics_of_interest: Vec::new(),
            search_history: Vec::new(),
            embedding: None,
            privacy_level,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonalizationRequest {
    pub user_id: String,
    pub content: Vec<Map<String, Value>>,
    #[serde(default)]
    pub context: Option<Map<String, Value>>,
    #[serde(default)]
    pub parameters: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PersonalizationResult {
    pub id: String,
    pub original_score: f64,
    pub personalized_score: f64,
    pub rank_change: i64,
    pub explanation: Option<BTreeMap<String, f64>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PersonalizationMetadata {
    #[serde(flatten)]
    pub base: Metadata,
    pub user_profile_age_days: f64,
    pub features_used: Vec<String>,
    pub model_version: String,
    pub profile_completeness: f64,
    pub privacy_level: PrivacyLevel,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PersonalizationResponse {
    pub results: Vec<PersonalizationResult>,
    pub content: Vec<Map<String, Value>>,
    pub metadata: PersonalizationMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserFeedbackRequest {
    pub user_id: String,
    pub item_id: String,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub feedback_text: Option<String>,
    #[serde(default = "default_source")]
    pub source: String,
    #[serde(default)]
    pub context: Map<String, Value>,
}

fn default_source() -> String {
    "search".to_owned()
}

/// Feedback as stored, with its assigned id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredFeedback {
    pub feedback_id: String,
    pub user_id: String,
    pub item_id: String,
    pub rating: Option<f64>,
    pub feedback_text: Option<String>,
    pub source: String,
    pub context: Map<String, Value>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserFeedbackResponse {
    pub status: String,
    pub feedback_id: String,
    pub message: Option<String>,
    pub metadata: Metadata,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PreferenceParams {
    #[serde(default)]
    pub category: Option<String>,
}

// End of file: /src/models/personalization.rs
