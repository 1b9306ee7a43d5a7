// Start of file: /src/services/search/trends.rs

use std::collections::BTreeMap;

const TECHNOLOGY: [&str; 10] = [
    "latest AI advances",
    "Python programming tutorial",
    "best coding practices",
    "FastAPI examples",
    "vector databases comparison",
    "machine learning frameworks",
    "data science tools",
    "kubernetes vs docker",
    "web3 development",
    "rust programming language",
];

const NEWS: [&str; 10] = [
    "breaking news today",
    "climate change updates",
    "economic forecast 2023",
    "election results",
    "international relations",
    "pandemic response",
    "technology innovations",
    "market trends",
    "space exploration",
    "renewable energy developments",
];

const ENTERTAINMENT: [&str; 10] = [
    "new movie releases",
    "popular TV shows",
    "music festival lineup",
    "celebrity interviews",
    "box office results",
    "streaming platform comparison",
    "book recommendations",
    "gaming news",
    "award show highlights",
    "concert tours",
];

const CATEGORIES: [(&str, &[&str]); 3] = [
    ("technology", &TECHNOLOGY),
    ("news", &NEWS),
    ("entertainment", &ENTERTAINMENT),
];

/// Trending queries per category, `limit` items each.
/// An unknown category yields an empty map.
pub fn trending(category: Option<&str>, limit: usize) -> BTreeMap<String, Vec<String>> {
    CATEGORIES
        .iter()
        .filter(|(name, _)| category.is_none_or(|wanted| wanted == *name))
        .map(|(name, items)| {
            (
                name.to_string(),
                items.iter().take(limit).map(|s| s.to_string()).collect(),
            )
        })
        .collect()
}

// End of file: /src/services/search/trends.rs
