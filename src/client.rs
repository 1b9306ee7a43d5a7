// Start of file: /src/client.rs

// * Typed HTTP client for the API. Every call checks its feature flag first,
// * then unwraps the response envelope.

use std::{collections::BTreeMap, time::Duration};

use axum::body::Bytes;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::environment::{EnvironmentVariables, DEFAULT_FEATURES};
use crate::models::{
    backup::{BackupJob, BackupJobCreate, BackupType},
    monitoring::SystemMetrics,
    notification::{Notification, NotificationResult},
    personalization::{PersonalizationRequest, PersonalizationResponse},
    scheduler::{Job, JobCreate},
    search::{Query, QueryInput, SearchRequest, SearchResponse, SearchResult},
    vector::{
        EmbedRequest, EmbedResponse, TextInput, UpsertVectorsRequest, UpsertVectorsResponse, VectorQuery,
        VectorRecord, VectorSearchRequest, VectorSearchResponse,
    },
};
use crate::utils::response_handler::ResponseFormat;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";
const DEFAULT_KEY_HEADER: &str = "X-API-Key";
const API_PREFIX: &str = "/api/v1";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Feature '{0}' is not available in your configuration")]
    FeatureUnavailable(String),
    #[error("API returned {status}: {}", messages.join("; "))]
    Api { status: u16, messages: Vec<String> },
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Unexpected response payload: {0}")]
    Decode(#[from] serde_json::Error),
}

/// The short form of a search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub score: f64,
}

impl From<&SearchResult> for SearchHit {
    fn from(result: &SearchResult) -> Self {
        // Provider score when present, otherwise derived from the rank
        let score: f64 = result
            .metadata
            .get("score")
            .and_then(Value::as_f64)
            .unwrap_or_else(|| 1.0 / result.rank.max(1) as f64);

        Self {
            title: result.title.clone(),
            url: result.url.clone(),
            score,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SearchClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    api_key_header: String,
    features: BTreeMap<String, bool>,
}

impl SearchClient {
    /// Client with the default feature set and a 60 second timeout.
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Result<Self, ClientError> {
        let features: BTreeMap<String, bool> =
            DEFAULT_FEATURES.iter().map(|(name, on)| ((*name).to_owned(), *on)).collect();
        Self::build(base_url.into(), api_key, DEFAULT_KEY_HEADER.to_owned(), features, DEFAULT_TIMEOUT)
    }

    /// Client aimed at the server described by `env`, sharing its feature map.
    pub fn from_env(env: &EnvironmentVariables, api_key: Option<String>) -> Result<Self, ClientError> {
        let host: &str = match env.host.as_ref() {
            "0.0.0.0" | "" => "127.0.0.1",
            other => other,
        };

        Self::build(
            format!("http://{host}:{}", env.port),
            api_key,
            env.api_key_header.to_string(),
            env.features.clone(),
            DEFAULT_TIMEOUT,
        )
    }

    fn build(
        base_url: String,
        api_key: Option<String>,
        api_key_header: String,
        features: BTreeMap<String, bool>,
        timeout: Duration,
    ) -> Result<Self, ClientError> {
        let http: reqwest::Client = reqwest::Client::builder().timeout(timeout).build()?;
        let base_url: String = if base_url.is_empty() {
            DEFAULT_BASE_URL.to_owned()
        } else {
            base_url.trim_end_matches('/').to_owned()
        };

        debug!("Initialized client with base URL: {base_url}");

        Ok(Self {
            http,
            base_url,
            api_key,
            api_key_header,
            features,
        })
    }

    pub fn with_timeout(self, timeout: Duration) -> Result<Self, ClientError> {
        Self::build(self.base_url, self.api_key, self.api_key_header, self.features, timeout)
    }

    pub fn with_features(mut self, features: BTreeMap<String, bool>) -> Self {
        self.features = features;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn require(&self, feature: &str) -> Result<(), ClientError> {
        if self.features.get(feature).copied().unwrap_or(false) {
            Ok(())
        } else {
            Err(ClientError::FeatureUnavailable(feature.to_owned()))
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder: RequestBuilder = self.http.request(method, format!("{}{API_PREFIX}{path}", self.base_url));
        match &self.api_key {
            Some(key) => builder.header(self.api_key_header.as_str(), key),
            None => builder,
        }
    }

    /// Sends the request and returns the envelope's `data`.
    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ClientError> {
        let response: reqwest::Response = builder.send().await?;
        let status: StatusCode = response.status();
        let bytes: Bytes = response.bytes().await?;

        let envelope: Option<ResponseFormat> = serde_json::from_slice(&bytes).ok();

        if !status.is_success() {
            let messages: Vec<String> = envelope.map(|e| e.messages).unwrap_or_default();
            warn!("Request failed with {status}: {messages:?}");
            return Err(ClientError::Api {
                status: status.as_u16(),
                messages,
            });
        }

        let data: Value = match envelope {
            Some(envelope) => envelope.data,
            None => serde_json::from_slice(&bytes)?,
        };
        Ok(serde_json::from_value(data)?)
    }

    /// True when the server accepts the configured key.
    pub async fn validate(&self) -> Result<bool, ClientError> {
        match self.send::<Value>(self.request(Method::GET, "/validate")).await {
            Ok(_) => Ok(true),
            Err(ClientError::Api { status: 401, .. }) => Ok(false),
            Err(err) => Err(err),
        }
    }

    pub async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>, ClientError> {
        let response: SearchResponse = self
            .search_raw(SearchRequest {
                query: QueryInput::Text(query.to_owned()),
                num_results: max_results,
                providers: None,
                parameters: Map::new(),
            })
            .await?;

        Ok(response.results.iter().map(SearchHit::from).collect())
    }

    pub async fn search_raw(&self, request: SearchRequest) -> Result<SearchResponse, ClientError> {
        self.require("metasearch")?;
        self.send(self.request(Method::POST, "/search").json(&request)).await
    }

    pub async fn analyze(&self, query: &str) -> Result<Query, ClientError> {
        self.require("metasearch")?;
        self.send(self.request(Method::GET, "/search/analyze").query(&[("query", query)]))
            .await
    }

    pub async fn embed(&self, texts: Vec<String>, model: Option<String>) -> Result<EmbedResponse, ClientError> {
        self.require("vector")?;
        let request: EmbedRequest = EmbedRequest {
            text: TextInput::Many(texts),
            model,
            normalize: true,
            parameters: Map::new(),
        };
        self.send(self.request(Method::POST, "/vector/embed").json(&request)).await
    }

    pub async fn vector_search(
        &self,
        query: VectorQuery,
        collection: &str,
        num_results: usize,
        filter: Option<Map<String, Value>>,
    ) -> Result<VectorSearchResponse, ClientError> {
        self.require("vector")?;
        let request: VectorSearchRequest = VectorSearchRequest {
            query,
            collection: collection.to_owned(),
            num_results,
            filter,
            parameters: Map::new(),
        };
        self.send(self.request(Method::POST, "/vector/search").json(&request)).await
    }

    pub async fn upsert_vectors(
        &self,
        collection: &str,
        vectors: Vec<VectorRecord>,
        create_collection: bool,
    ) -> Result<UpsertVectorsResponse, ClientError> {
        self.require("vector")?;
        let request: UpsertVectorsRequest = UpsertVectorsRequest {
            collection: collection.to_owned(),
            vectors,
            create_collection,
        };
        self.send(self.request(Method::POST, "/vector/upsert").json(&request)).await
    }

    pub async fn personalize(&self, request: PersonalizationRequest) -> Result<PersonalizationResponse, ClientError> {
        self.require("personalization")?;
        self.send(self.request(Method::POST, "/personalization/rerank").json(&request))
            .await
    }

    pub async fn schedule(&self, job: JobCreate) -> Result<Job, ClientError> {
        self.require("scheduler")?;
        self.send(self.request(Method::POST, "/scheduler/jobs").json(&job)).await
    }

    pub async fn metrics(&self) -> Result<SystemMetrics, ClientError> {
        self.require("monitor")?;
        self.send(self.request(Method::GET, "/monitor/metrics")).await
    }

    pub async fn backup(&self, backup_type: BackupType, description: Option<String>) -> Result<BackupJob, ClientError> {
        self.require("backup")?;
        let request: BackupJobCreate = BackupJobCreate { backup_type, description };
        self.send(self.request(Method::POST, "/backup/jobs").json(&request)).await
    }

    pub async fn send_notification(&self, notification: Notification) -> Result<NotificationResult, ClientError> {
        self.require("notifications")?;
        self.send(self.request(Method::POST, "/notifications/send").json(&notification))
            .await
    }

    /// Escape hatch for endpoints without a typed wrapper.
    pub async fn raw(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value, ClientError> {
        let builder: RequestBuilder = self.request(method, path);
        let builder: RequestBuilder = match body {
            Some(body) => builder.json(&body),
            None => builder,
        };
        self.send(builder).await
    }
}

// End of file: /src/client.rs
