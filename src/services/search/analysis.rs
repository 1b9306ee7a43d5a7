// Start of file: /src/services/search/analysis.rs

// * Keyword rules for query intent and locality.

use chrono::Utc;
use uuid::Uuid;

use crate::models::search::{Query, SearchIntent, SearchLocality};

const STOPWORDS: [&str; 24] = [
    "a", "an", "the", "in", "on", "at", "of", "for", "to", "and", "or", "is", "are", "was", "were",
    "be", "with", "by", "from", "as", "it", "this", "that", "into",
];

// ? First matching rule wins, so order matters
const INTENT_RULES: [(SearchIntent, &[&str]); 6] = [
    (SearchIntent::Navigational, &["login", "sign in", "homepage", "official site", "www.", ".com", ".org"]),
    (SearchIntent::Transactional, &["buy", "order", "download", "purchase", "subscribe", "coupon"]),
    (
        SearchIntent::Local,
        &["near me", "nearby", "restaurant", "restaurants", "hotel", "hotels", "directions", "open now", "closest"],
    ),
    (
        SearchIntent::Visual,
        &["image", "images", "photo", "photos", "picture", "pictures", "video", "videos", "wallpaper"],
    ),
    (SearchIntent::News, &["news", "latest", "breaking", "today", "headlines"]),
    (SearchIntent::Commercial, &["best", "review", "reviews", "compare", "vs", "top", "cheap", "price"]),
];

const LOCAL_WORDS: [&str; 5] = ["near me", "nearby", "closest", "open now", "directions"];
const REGIONAL_WORDS: [&str; 5] = ["region", "regional", "state", "county", "province"];
const NATIONAL_WORDS: [&str; 11] = [
    "national", "nationwide", "usa", "united states", "uk", "canada", "india", "germany", "france",
    "japan", "australia",
];

/// Lowercases and drops stopwords.
pub fn preprocess(text: &str) -> String {
    text.to_lowercase()
        .split_whitespace()
        .filter(|word| !STOPWORDS.contains(word))
        .collect::<Vec<&str>>()
        .join(" ")
}

// * Lowercase, punctuation (except dots) turned into spaces, padded
fn normalize(text: &str) -> String {
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '.' { c } else { ' ' })
        .collect();
    format!(" {} ", cleaned.split_whitespace().collect::<Vec<&str>>().join(" "))
}

// Dotted keywords match anywhere, the rest on word boundaries
fn matches(normalized: &str, keyword: &str) -> bool {
    if keyword.contains('.') {
        normalized.contains(keyword)
    } else {
        normalized.contains(&format!(" {keyword} "))
    }
}

pub fn classify_intent(text: &str) -> SearchIntent {
    let normalized: String = normalize(text);
    if normalized.trim().is_empty() {
        return SearchIntent::Undefined;
    }

    INTENT_RULES
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| matches(&normalized, k)))
        .map(|(intent, _)| *intent)
        .unwrap_or(SearchIntent::Informational)
}

pub fn classify_locality(text: &str, intent: SearchIntent) -> SearchLocality {
    let normalized: String = normalize(text);
    if normalized.trim().is_empty() {
        return SearchLocality::Undefined;
    }

    if LOCAL_WORDS.iter().any(|w| matches(&normalized, w)) {
        return SearchLocality::Local;
    }
    // "restaurants in new york": a local need scoped to a place
    if intent == SearchIntent::Local && matches(&normalized, "in") {
        return SearchLocality::Local;
    }
    if REGIONAL_WORDS.iter().any(|w| matches(&normalized, w)) {
        return SearchLocality::Regional;
    }
    if NATIONAL_WORDS.iter().any(|w| matches(&normalized, w)) {
        return SearchLocality::National;
    }

    SearchLocality::Global
}

/// Builds an analysed `Query` with a fresh id and timestamp.
pub fn analyze_query(text: &str) -> Query {
    let intent: SearchIntent = classify_intent(text);

    Query {
        text: text.to_owned(),
        intent,
        locality: classify_locality(text, intent),
        language: "en".to_owned(),
        query_id: Some(Uuid::new_v4().to_string()),
        timestamp: Some(Utc::now()),
        processed_text: Some(preprocess(text)),
        ..Default::default()
    }
}

// End of file: /src/services/search/analysis.rs
