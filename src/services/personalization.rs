// Start of file: /src/services/personalization.rs

// * Re-ranks content against a stored user profile.

use std::{
    cmp::Ordering,
    collections::{BTreeMap, BTreeSet, HashMap},
    time::Instant,
};

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::common::Metadata;
use crate::models::personalization::{
    PersonalizationMetadata, PersonalizationRequest, PersonalizationResponse, PersonalizationResult,
    PrivacyLevel, SearchHistoryItem, StoredFeedback, UserFeedbackRequest, UserFeedbackResponse,
    UserPreference, UserPreferenceUpdate, UserProfile,
};
use crate::utils::error_handler::ServiceError;

pub const MODEL_VERSION: &str = "personalization-v1";
pub const MAX_HISTORY: usize = 100;

const DEFAULT_SCORE: f64 = 0.5;
const TOPIC_BOOST: f64 = 0.1;
const MAX_TOPIC_BOOST: f64 = 0.3;
const RECENCY_BASE: f64 = 0.2;
const RECENCY_DECAY_PER_DAY: f64 = 0.01;
const HISTORY_BOOST: f64 = 0.05;
const MAX_HISTORY_BOOST: f64 = 0.15;

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct PersonalizationSnapshot {
    pub profiles: HashMap<String, UserProfile>,
    pub feedback: HashMap<String, Vec<StoredFeedback>>,
    pub preferences: HashMap<String, BTreeMap<String, UserPreference>>,
}

pub struct PersonalizationService {
    enabled: bool,
    default_privacy: PrivacyLevel,
    profiles: RwLock<HashMap<String, UserProfile>>,
    feedback: RwLock<HashMap<String, Vec<StoredFeedback>>>,
    preferences: RwLock<HashMap<String, BTreeMap<String, UserPreference>>>,
}

impl PersonalizationService {
    pub fn new(enabled: bool, default_privacy: PrivacyLevel) -> Self {
        info!("PersonalizationService initialized (enabled: {enabled}, privacy: {default_privacy})");
        Self {
            enabled,
            default_privacy,
            profiles: RwLock::new(HashMap::new()),
            feedback: RwLock::new(HashMap::new()),
            preferences: RwLock::new(HashMap::new()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn ensure_enabled(&self) -> Result<(), ServiceError> {
        if self.enabled {
            Ok(())
        } else {
            Err(ServiceError::Unavailable(
                "Personalization is not enabled. Please check API settings.".to_owned(),
            ))
        }
    }

    pub async fn get_user_profile(&self, user_id: &str) -> Result<UserProfile, ServiceError> {
        self.ensure_enabled()?;

        let mut profiles = self.profiles.write().await;
        let profile: &UserProfile = profiles.entry(user_id.to_owned()).or_insert_with(|| {
            debug!("Creating empty profile for user {user_id}");
            UserProfile::empty(user_id, self.default_privacy)
        });

        Ok(profile.clone())
    }

    pub async fn update_user_profile(&self, user_id: &str, mut profile: UserProfile) -> Result<UserProfile, ServiceError> {
        self.ensure_enabled()?;

        if user_id != profile.user_id {
            return Err(ServiceError::InvalidInput(
                "User ID in path does not match user ID in profile".to_owned(),
            ));
        }

        profile.updated_at = Utc::now();
        cap_history(&mut profile.search_history);

        self.profiles.write().await.insert(user_id.to_owned(), profile.clone());
        info!("Updated profile for user {user_id}");
        Ok(profile)
    }

    pub async fn personalize_content(&self, request: PersonalizationRequest) -> Result<PersonalizationResponse, ServiceError> {
        self.ensure_enabled()?;
        let started: Instant = Instant::now();

        let mut profile: UserProfile = self.get_user_profile(&request.user_id).await?;
        let now: DateTime<Utc> = Utc::now();

        let original_scores: Vec<f64> = request
            .content
            .iter()
            .map(|item| item.get("score").and_then(Value::as_f64).unwrap_or(DEFAULT_SCORE))
            .collect();

        let mut content: Vec<Map<String, Value>> = request.content;
        let mut results: Vec<PersonalizationResult> = Vec::with_capacity(content.len());

        for (i, item) in content.iter_mut().enumerate() {
            let original_score: f64 = original_scores[i];
            let (personalized_score, explanation) = score_item(item, original_score, &profile, now);

            let rank_change: i64 = if i > 0 && personalized_score > original_scores[i - 1] {
                -1
            } else if i + 1 < original_scores.len() && personalized_score < original_scores[i + 1] {
                1
            } else {
                0
            };

            let id: String = match item.get("id") {
                Some(Value::String(id)) => id.clone(),
                Some(other) => other.to_string(),
                None => format!("item-{i}"),
            };

            results.push(PersonalizationResult {
                id,
                original_score,
                personalized_score,
                rank_change,
                explanation: Some(explanation),
            });
            item.insert("score".to_owned(), Value::from(personalized_score));
        }

        // Stable, so ties keep their input order
        content.sort_by(|a, b| {
            let a: f64 = a.get("score").and_then(Value::as_f64).unwrap_or(0.0);
            let b: f64 = b.get("score").and_then(Value::as_f64).unwrap_or(0.0);
            b.partial_cmp(&a).unwrap_or(Ordering::Equal)
        });

        let features_used: Vec<String> = results
            .iter()
            .flat_map(|r| r.explanation.iter().flat_map(|e| e.keys().cloned()))
            .collect::<BTreeSet<String>>()
            .into_iter()
            .collect();

        let query: Option<&str> = request
            .context
            .as_ref()
            .and_then(|c| c.get("query"))
            .and_then(Value::as_str)
            .filter(|q| !q.trim().is_empty());

        if let Some(query) = query {
            profile = self.record_search(&request.user_id, query, now).await;
        }

        let user_profile_age_days: f64 = (now - profile.created_at).num_seconds().max(0) as f64 / 86_400.0;

        Ok(PersonalizationResponse {
            results,
            content,
            metadata: PersonalizationMetadata {
                base: Metadata::since(started),
                user_profile_age_days,
                features_used,
                model_version: MODEL_VERSION.to_owned(),
                profile_completeness: profile_completeness(&profile),
                privacy_level: profile.privacy_level,
            },
        })
    }

    /// Appends to the stored history in place, unless privacy is high.
    async fn record_search(&self, user_id: &str, query: &str, now: DateTime<Utc>) -> UserProfile {
        let mut profiles = self.profiles.write().await;
        let profile: &mut UserProfile = profiles
            .entry(user_id.to_owned())
            .or_insert_with(|| UserProfile::empty(user_id, self.default_privacy));

        if profile.privacy_level != PrivacyLevel::High {
            profile.search_history.push(SearchHistoryItem::new(query));
            cap_history(&mut profile.search_history);
            profile.updated_at = now;
        }

        profile.clone()
    }

    pub async fn submit_user_feedback(&self, request: UserFeedbackRequest) -> Result<UserFeedbackResponse, ServiceError> {
        self.ensure_enabled()?;
        let started: Instant = Instant::now();

        if let Some(rating) = request.rating {
            if !(1.0..=5.0).contains(&rating) {
                return Err(ServiceError::InvalidInput("Rating must be between 1 and 5".to_owned()));
            }
        }

        let feedback_id: String = Uuid::new_v4().to_string();
        let stored: StoredFeedback = StoredFeedback {
            feedback_id: feedback_id.clone(),
            user_id: request.user_id.clone(),
            item_id: request.item_id,
            rating: request.rating,
            feedback_text: request.feedback_text,
            source: request.source,
            context: request.context,
            timestamp: Utc::now(),
        };

        self.feedback
            .write()
            .await
            .entry(request.user_id.clone())
            .or_default()
            .push(stored);
        info!("Stored feedback {feedback_id} for user {}", request.user_id);

        Ok(UserFeedbackResponse {
            status: "success".to_owned(),
            feedback_id,
            message: Some("Feedback submitted successfully".to_owned()),
            metadata: Metadata::since(started),
        })
    }

    pub async fn get_user_feedback(&self, user_id: &str) -> Vec<StoredFeedback> {
        self.feedback.read().await.get(user_id).cloned().unwrap_or_default()
    }

    /// Categorised preferences plus plain profile preferences without a category.
    pub async fn get_user_preferences(&self, user_id: &str, category: Option<&str>) -> Result<Vec<UserPreference>, ServiceError> {
        let profile: UserProfile = self.get_user_profile(user_id).await?;
        let stored: BTreeMap<String, UserPreference> = self
            .preferences
            .read()
            .await
            .get(user_id)
            .cloned()
            .unwrap_or_default();

        let mut all: Vec<UserPreference> = stored.values().cloned().collect();
        for (key, value) in &profile.preferences {
            if !stored.contains_key(key) {
                all.push(UserPreference {
                    key: key.clone(),
                    value: value.clone(),
                    category: None,
                    timestamp: profile.updated_at,
                });
            }
        }

        Ok(match category {
            Some(wanted) => all
                .into_iter()
                .filter(|p| p.category.as_deref() == Some(wanted))
                .collect(),
            None => all,
        })
    }

    pub async fn set_user_preference(&self, user_id: &str, update: UserPreferenceUpdate) -> Result<UserPreference, ServiceError> {
        self.ensure_enabled()?;

        if update.key.trim().is_empty() {
            return Err(ServiceError::InvalidInput("Preference key must not be empty".to_owned()));
        }

        let preference: UserPreference = UserPreference {
            key: update.key.clone(),
            value: update.value.clone(),
            category: update.category,
            timestamp: Utc::now(),
        };

        // * Mirror the value into the profile so scoring and backups see it
        {
            let mut profiles = self.profiles.write().await;
            let profile: &mut UserProfile = profiles
                .entry(user_id.to_owned())
                .or_insert_with(|| UserProfile::empty(user_id, self.default_privacy));
            profile.preferences.insert(update.key.clone(), update.value);
            profile.updated_at = preference.timestamp;
        }

        self.preferences
            .write()
            .await
            .entry(user_id.to_owned())
            .or_default()
            .insert(update.key, preference.clone());

        Ok(preference)
    }

    pub async fn profile_count(&self) -> usize {
        self.profiles.read().await.len()
    }

    pub async fn snapshot(&self) -> PersonalizationSnapshot {
        PersonalizationSnapshot {
            profiles: self.profiles.read().await.clone(),
            feedback: self.feedback.read().await.clone(),
            preferences: self.preferences.read().await.clone(),
        }
    }

    pub async fn restore(&self, snapshot: PersonalizationSnapshot) {
        let count: usize = snapshot.profiles.len();
        self.profiles.write().await.extend(snapshot.profiles);
        self.feedback.write().await.extend(snapshot.feedback);
        self.preferences.write().await.extend(snapshot.preferences);
        info!("Restored {count} user profiles");
    }
}

fn cap_history(history: &mut Vec<SearchHistoryItem>) {
    if history.len() > MAX_HISTORY {
        let excess: usize = history.len() - MAX_HISTORY;
        history.drain(..excess);
    }
}

/// Accepts RFC3339, a naive `YYYY-MM-DDTHH:MM:SS[.f]` (taken as UTC) or a bare date.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Returns the clamped personalised score and the boosts that produced it.
pub fn score_item(
    item: &Map<String, Value>,
    original_score: f64,
    profile: &UserProfile,
    now: DateTime<Utc>,
) -> (f64, BTreeMap<String, f64>) {
    let mut score: f64 = original_score;
    let mut explanation: BTreeMap<String, f64> = BTreeMap::new();
    let title: String = item
        .get("title")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_lowercase();

    let matched_topics: usize = profile
        .topics_of_interest
        .iter()
        .filter(|topic| !topic.is_empty() && title.contains(&topic.to_lowercase()))
        .count();
    if matched_topics > 0 {
        let boost: f64 = (matched_topics as f64 * TOPIC_BOOST).min(MAX_TOPIC_BOOST);
        score += boost;
        explanation.insert("topic_relevance".to_owned(), boost);
    }

    if let Some(published) = item.get("timestamp").and_then(Value::as_str).and_then(parse_timestamp) {
        let days_old: f64 = (now - published).num_days().max(0) as f64;
        let boost: f64 = (RECENCY_BASE - days_old * RECENCY_DECAY_PER_DAY).max(0.0);
        score += boost;
        explanation.insert("recency_boost".to_owned(), boost);
    }

    let history_hits: usize = profile
        .search_history
        .iter()
        .map(|h| h.query.to_lowercase())
        .filter(|q| !q.is_empty() && title.contains(q.as_str()))
        .count();
    if history_hits > 0 {
        let boost: f64 = (history_hits as f64 * HISTORY_BOOST).min(MAX_HISTORY_BOOST);
        score += boost;
        explanation.insert("history_match".to_owned(), boost);
    }

    (score.clamp(0.0, 1.0), explanation)
}

pub fn profile_completeness(profile: &UserProfile) -> f64 {
    let populated: [bool; 4] = [
        !profile.preferences.is_empty(),
        !profile.topics_of_interest.is_empty(),
        !profile.search_history.is_empty(),
        profile.embedding.as_ref().is_some_and(|e| !e.is_empty()),
    ];

    let mut completeness: f64 = populated.iter().filter(|p| **p).count() as f64 / populated.len() as f64;
    completeness += (profile.preferences.len() as f64 * 0.02).min(0.1);
    completeness += (profile.topics_of_interest.len() as f64 * 0.02).min(0.1);
    completeness += (profile.search_history.len() as f64 * 0.01).min(0.1);

    completeness.clamp(0.0, 1.0)
}

// End of file: /src/services/personalization.rs
