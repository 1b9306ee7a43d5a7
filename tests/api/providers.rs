//! tests/api/providers.rs
//! Google and Bing providers against local stand-ins for their APIs.

#[path = "../mod.rs"]
mod common;

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use axum::{extract::Query, http::HeaderMap, http::StatusCode, routing::get, Json, Router};
use serde_json::{json, Value};

use llamasearch::models::search::SearchResult;
use llamasearch::services::search::providers::{
    http_client, BingProvider, GoogleProvider, ProviderError, SearchProvider,
};

type Seen = Arc<Mutex<Vec<HashMap<String, String>>>>;

fn google_items(count: usize) -> Value {
    let items: Vec<Value> = (1..=count)
        .map(|i| {
            json!({
                "title": format!("Title {i}"),
                "link": format!("https://g.example.com/{i}"),
                "snippet": format!("Snippet {i}"),
                "displayLink": "g.example.com"
            })
        })
        .collect();
    json!({ "items": items })
}

#[tokio::test]
async fn google_maps_items_and_caps_num() {
    let seen: Seen = Arc::new(Mutex::new(Vec::new()));
    let recorder: Seen = seen.clone();
    let router: Router = Router::new().route(
        "/customsearch",
        get(move |Query(params): Query<HashMap<String, String>>| async move {
            recorder.lock().unwrap().push(params);
            Json(google_items(12))
        }),
    );
    let base: String = common::spawn_stub(router).await;

    let provider: GoogleProvider = GoogleProvider::new(http_client(std::time::Duration::from_secs(5)), "g-key", "g-cx")
        .with_endpoint(format!("{base}/customsearch"));
    let results: Vec<SearchResult> = provider.search("rust", 50).await.unwrap();

    assert_eq!(results.len(), 10);
    assert_eq!(results[0].title, "Title 1");
    assert_eq!(results[0].url, "https://g.example.com/1");
    assert_eq!(results[0].snippet, "Snippet 1");
    assert_eq!(results[0].provider, "google");
    assert_eq!(results[0].rank, 1);
    assert_eq!(results[9].rank, 10);
    assert_eq!(results[0].metadata["display_link"], "g.example.com");

    let params: HashMap<String, String> = seen.lock().unwrap()[0].clone();
    assert_eq!(params["num"], "10");
    assert_eq!(params["key"], "g-key");
    assert_eq!(params["cx"], "g-cx");
    assert_eq!(params["q"], "rust");
}

#[tokio::test]
async fn bing_maps_web_pages_and_sends_the_key_header() {
    let seen: Seen = Arc::new(Mutex::new(Vec::new()));
    let recorder: Seen = seen.clone();
    let router: Router = Router::new().route(
        "/search",
        get(move |headers: HeaderMap, Query(mut params): Query<HashMap<String, String>>| async move {
            let key: String = headers
                .get("Ocp-Apim-Subscription-Key")
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_owned();
            params.insert("header_key".to_owned(), key);
            recorder.lock().unwrap().push(params);

            Json(json!({
                "webPages": { "value": [
                    { "name": "First", "url": "https://b.example.com/1", "snippet": "one", "dateLastCrawled": "2024-01-01T00:00:00" },
                    { "name": "Second", "url": "https://b.example.com/2" }
                ]}
            }))
        }),
    );
    let base: String = common::spawn_stub(router).await;

    let provider: BingProvider =
        BingProvider::new(http_client(std::time::Duration::from_secs(5)), "b-key").with_endpoint(format!("{base}/search"));
    let results: Vec<SearchResult> = provider.search("tokio", 80).await.unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].title, "First");
    assert_eq!(results[0].provider, "bing");
    assert_eq!(results[0].metadata["date_last_crawled"], "2024-01-01T00:00:00");
    assert_eq!(results[1].snippet, "");
    assert_eq!(results[1].rank, 2);

    let params: HashMap<String, String> = seen.lock().unwrap()[0].clone();
    assert_eq!(params["count"], "50");
    assert_eq!(params["header_key"], "b-key");
}

#[tokio::test]
async fn bing_without_web_pages_is_empty() {
    let router: Router = Router::new().route("/search", get(|| async { Json(json!({ "_type": "SearchResponse" })) }));
    let base: String = common::spawn_stub(router).await;

    let provider: BingProvider =
        BingProvider::new(http_client(std::time::Duration::from_secs(5)), "b-key").with_endpoint(format!("{base}/search"));
    assert!(provider.search("nothing", 5).await.unwrap().is_empty());
}

#[tokio::test]
async fn upstream_errors_become_provider_errors() {
    let router: Router = Router::new()
        .route("/customsearch", get(|| async { (StatusCode::FORBIDDEN, "quota exceeded") }))
        .route("/search", get(|| async { StatusCode::INTERNAL_SERVER_ERROR }));
    let base: String = common::spawn_stub(router).await;

    let google: GoogleProvider = GoogleProvider::new(http_client(std::time::Duration::from_secs(5)), "k", "cx")
        .with_endpoint(format!("{base}/customsearch"));
    let err: ProviderError = google.search("rust", 5).await.unwrap_err();
    assert!(matches!(err, ProviderError::Status(403)));

    let bing: BingProvider =
        BingProvider::new(http_client(std::time::Duration::from_secs(5)), "k").with_endpoint(format!("{base}/search"));
    let err: ProviderError = bing.search("rust", 5).await.unwrap_err();
    assert!(matches!(err, ProviderError::Status(500)));

    let unreachable: BingProvider = BingProvider::new(http_client(std::time::Duration::from_secs(5)), "k")
        .with_endpoint(format!("{}/search", common::closed_address().await));
    let err: ProviderError = unreachable.search("rust", 5).await.unwrap_err();
    assert!(matches!(err, ProviderError::Network(_)));
}
