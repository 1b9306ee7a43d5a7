//! tests/mod.rs
//! A shared test helper to spawn the full app on an ephemeral port.

#![allow(dead_code)]

use std::{collections::HashMap, sync::Arc, time::Duration};

use async_trait::async_trait;
use axum::{serve, Router};
use chrono::Utc;
use serde_json::{Map, Value};
use tempfile::TempDir;
use tokio::net::TcpListener as TokioTcpListener;

use llamasearch::config::{environment::EnvironmentVariables, state::AppState};
use llamasearch::core::server::create_app;
use llamasearch::models::search::{SearchResult, SearchResultType};
use llamasearch::services::search::providers::{ProviderError, SearchProvider};
use llamasearch::services::SearchService;

pub const API_KEY: &str = "test-key";

/// A running server plus handles the tests may poke at directly.
pub struct TestApp {
    pub address: String,
    pub state: AppState,
    pub client: reqwest::Client,
    // Dropped with the app so the storage dir outlives the server
    _storage: TempDir,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.client.get(self.url(path)).header("X-API-Key", API_KEY)
    }

    pub fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.client.post(self.url(path)).header("X-API-Key", API_KEY)
    }

    pub fn put(&self, path: &str) -> reqwest::RequestBuilder {
        self.client.put(self.url(path)).header("X-API-Key", API_KEY)
    }

    pub fn delete(&self, path: &str) -> reqwest::RequestBuilder {
        self.client.delete(self.url(path)).header("X-API-Key", API_KEY)
    }
}

/// Provider returning canned results, optionally after a delay.
pub struct StaticProvider {
    pub name: String,
    pub urls: Vec<String>,
    pub delay: Duration,
}

impl StaticProvider {
    pub fn new(name: &str, urls: &[&str]) -> Arc<dyn SearchProvider> {
        Arc::new(Self {
            name: name.to_owned(),
            urls: urls.iter().map(|u| (*u).to_owned()).collect(),
            delay: Duration::ZERO,
        })
    }

    pub fn slow(name: &str, delay: Duration) -> Arc<dyn SearchProvider> {
        Arc::new(Self {
            name: name.to_owned(),
            urls: vec!["https://slow.example.com/".to_owned()],
            delay,
        })
    }
}

#[async_trait]
impl SearchProvider for StaticProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn search(&self, query: &str, num_results: usize) -> Result<Vec<SearchResult>, ProviderError> {
        tokio::time::sleep(self.delay).await;

        Ok(self
            .urls
            .iter()
            .take(num_results)
            .enumerate()
            .map(|(i, url)| SearchResult {
                title: format!("{query} result {}", i + 1),
                url: url.clone(),
                snippet: format!("About {query}"),
                provider: self.name.clone(),
                rank: i + 1,
                timestamp: Some(Utc::now()),
                metadata: Map::<String, Value>::new(),
                content_type: SearchResultType::Web,
                is_ad: false,
                cached_url: None,
                attribution: None,
                dark_pattern_flags: Default::default(),
                result_id: None,
            })
            .collect())
    }
}

/// Spawns the app with two canned providers and the test API key.
pub async fn spawn_app() -> TestApp {
    spawn_app_with(
        &[],
        vec![
            StaticProvider::new("google", &["https://a.example.com/", "https://b.example.com/"]),
            StaticProvider::new("bing", &["https://b.example.com", "https://c.example.com/"]),
        ],
    )
    .await
}

/// Spawns the app with extra configuration and the given providers.
pub async fn spawn_app_with(vars: &[(&str, &str)], providers: Vec<Arc<dyn SearchProvider>>) -> TestApp {
    let storage: TempDir = tempfile::tempdir().expect("Failed to create temp dir");

    // * Build the configuration from a map so the process env never leaks in
    let mut map: HashMap<String, String> = HashMap::from([
        ("LLAMASEARCH_API_KEYS".to_owned(), API_KEY.to_owned()),
        (
            "LLAMASEARCH_STORAGE_DIR".to_owned(),
            storage.path().to_string_lossy().into_owned(),
        ),
    ]);
    for (key, value) in vars {
        map.insert((*key).to_owned(), (*value).to_owned());
    }

    let env: EnvironmentVariables = EnvironmentVariables::from_map(&map).expect("Invalid test configuration");
    let state: AppState = AppState::with_search(Arc::new(env), SearchService::with_providers(providers, None))
        .expect("Failed to build state");

    let app: Router = create_app(state.clone());

    // * Bind an ephemeral port
    let listener: TokioTcpListener = TokioTcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let addr: std::net::SocketAddr = listener.local_addr().unwrap();

    // * Spawn the server in a background task.
    tokio::spawn(async move {
        serve(listener, app).await.expect("Server failed");
    });

    TestApp {
        address: format!("http://{}", addr),
        state,
        client: reqwest::Client::new(),
        _storage: storage,
    }
}

/// Serves a bare router (no envelope, no auth) on an ephemeral port.
/// Stands in for upstream services such as search APIs or webhook receivers.
pub async fn spawn_stub(router: Router) -> String {
    let listener: TokioTcpListener = TokioTcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let addr: std::net::SocketAddr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        serve(listener, router).await.expect("Stub server failed");
    });

    format!("http://{}", addr)
}

/// An address nothing listens on.
pub async fn closed_address() -> String {
    let listener: TokioTcpListener = TokioTcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let addr: std::net::SocketAddr = listener.local_addr().unwrap();
    drop(listener);

    format!("http://{}", addr)
}

/// Reads the envelope of a response.
pub async fn envelope(resp: reqwest::Response) -> Value {
    let body: String = resp.text().await.unwrap();
    serde_json::from_str(&body).unwrap()
}
