// Start of file: /src/services/search/providers.rs

// * Web search providers behind one async trait.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::models::search::{SearchResult, SearchResultType};

const GOOGLE_ENDPOINT: &str = "https://www.googleapis.com/customsearch/v1";
const BING_ENDPOINT: &str = "https://api.bing.microsoft.com/v7.0/search";

// Per-provider caps imposed by the upstream APIs
const GOOGLE_MAX_RESULTS: usize = 10;
const BING_MAX_RESULTS: usize = 50;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Provider returned HTTP {0}")]
    Status(u16),
    #[error("Timeout")]
    Timeout,
}

#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Lowercase identifier, e.g. `google`.
    fn name(&self) -> &str;

    async fn search(&self, query: &str, num_results: usize) -> Result<Vec<SearchResult>, ProviderError>;
}

pub fn http_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("llamasearch/", env!("CARGO_PKG_VERSION")))
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

fn result(provider: &str, rank: usize, title: String, url: String, snippet: String) -> SearchResult {
    SearchResult {
        title,
        url,
        snippet,
        provider: provider.to_owned(),
        rank,
        timestamp: Some(Utc::now()),
        metadata: Map::new(),
        content_type: SearchResultType::Web,
        is_ad: false,
        cached_url: None,
        attribution: None,
        dark_pattern_flags: Default::default(),
        result_id: Some(format!("{provider}-{}", Uuid::new_v4())),
    }
}

// ---------------------------------------------------------------------------
// Google Custom Search
// ---------------------------------------------------------------------------

pub struct GoogleProvider {
    client: reqwest::Client,
    api_key: String,
    cx: String,
    endpoint: String,
}

#[derive(Deserialize)]
struct GoogleResponse {
    #[serde(default)]
    items: Vec<GoogleItem>,
}

#[derive(Deserialize)]
struct GoogleItem {
    title: String,
    link: String,
    #[serde(default)]
    snippet: String,
    #[serde(rename = "displayLink", default)]
    display_link: Option<String>,
    #[serde(rename = "cacheId", default)]
    cache_id: Option<String>,
}

impl GoogleProvider {
    pub fn new(client: reqwest::Client, api_key: impl Into<String>, cx: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            cx: cx.into(),
            endpoint: GOOGLE_ENDPOINT.to_owned(),
        }
    }

    /// Points the provider at another Custom Search compatible endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl SearchProvider for GoogleProvider {
    fn name(&self) -> &str {
        "google"
    }

    async fn search(&self, query: &str, num_results: usize) -> Result<Vec<SearchResult>, ProviderError> {
        let num: usize = num_results.clamp(1, GOOGLE_MAX_RESULTS);
        let num_param: String = num.to_string();
        debug!("Querying Google for '{query}' (num={num})");

        let response: reqwest::Response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("key", self.api_key.as_str()),
                ("cx", self.cx.as_str()),
                ("q", query),
                ("num", num_param.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ProviderError::Status(response.status().as_u16()));
        }

        let body: GoogleResponse = response.json().await?;

        Ok(body
            .items
            .into_iter()
            .take(num)
            .enumerate()
            .map(|(i, item)| {
                let mut r: SearchResult = result("google", i + 1, item.title, item.link, item.snippet);
                if let Some(site) = item.display_link {
                    r.metadata.insert("display_link".to_owned(), Value::String(site));
                }
                if let Some(cache_id) = item.cache_id {
                    r.metadata.insert("cache_id".to_owned(), json!(cache_id));
                }
                r
            })
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Bing Web Search
// ---------------------------------------------------------------------------

pub struct BingProvider {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
}

#[derive(Deserialize)]
struct BingResponse {
    #[serde(rename = "webPages", default)]
    web_pages: Option<BingWebPages>,
}

#[derive(Deserialize)]
struct BingWebPages {
    #[serde(default)]
    value: Vec<BingItem>,
}

#[derive(Deserialize)]
struct BingItem {
    name: String,
    url: String,
    #[serde(default)]
    snippet: String,
    #[serde(rename = "dateLastCrawled", default)]
    date_last_crawled: Option<String>,
}

impl BingProvider {
    pub fn new(client: reqwest::Client, api_key: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            endpoint: BING_ENDPOINT.to_owned(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl SearchProvider for BingProvider {
    fn name(&self) -> &str {
        "bing"
    }

    async fn search(&self, query: &str, num_results: usize) -> Result<Vec<SearchResult>, ProviderError> {
        let count: usize = num_results.clamp(1, BING_MAX_RESULTS);
        let count_param: String = count.to_string();
        debug!("Querying Bing for '{query}' (count={count})");

        let response: reqwest::Response = self
            .client
            .get(&self.endpoint)
            .header("Ocp-Apim-Subscription-Key", &self.api_key)
            .query(&[("q", query), ("count", count_param.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ProviderError::Status(response.status().as_u16()));
        }

        let body: BingResponse = response.json().await?;
        let items: Vec<BingItem> = body.web_pages.map(|p| p.value).unwrap_or_default();

        Ok(items
            .into_iter()
            .take(count)
            .enumerate()
            .map(|(i, item)| {
                let mut r: SearchResult = result("bing", i + 1, item.name, item.url, item.snippet);
                if let Some(crawled) = item.date_last_crawled {
                    r.metadata.insert("date_last_crawled".to_owned(), Value::String(crawled));
                }
                r
            })
            .collect())
    }
}

// End of file: /src/services/search/providers.rs
