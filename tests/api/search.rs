//! tests/api/search.rs
//! Metasearch, query analysis and trends.

#[path = "../mod.rs"]
mod common;

use reqwest::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn search_interleaves_and_deduplicates_providers() {
    let app: common::TestApp = common::spawn_app().await;

    let resp: reqwest::Response = app
        .post("/api/v1/search")
        .json(&json!({ "query": "rust web frameworks", "num_results": 10 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let json: Value = common::envelope(resp).await;
    assert_eq!(json["status"], "OK");

    let urls: Vec<&str> = json["data"]["results"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["url"].as_str().unwrap())
        .collect();
    assert_eq!(
        urls,
        vec!["https://a.example.com/", "https://b.example.com", "https://c.example.com/"]
    );

    let metadata: &Value = &json["data"]["metadata"];
    assert_eq!(metadata["deduplication_stats"]["duplicates_found"], 1);
    assert_eq!(metadata["result_counts"]["total"], 3);
    assert_eq!(metadata["aggregation_strategy"], "interleaved");
    assert_eq!(json["data"]["query"]["text"], "rust web frameworks");
}

#[tokio::test]
async fn search_honours_requested_providers() {
    let app: common::TestApp = common::spawn_app().await;

    let json: Value = common::envelope(
        app.post("/api/v1/search")
            .json(&json!({ "query": "rust", "providers": ["bing"] }))
            .send()
            .await
            .unwrap(),
    )
    .await;

    assert_eq!(json["data"]["metadata"]["engines_used"], json!(["bing"]));
    assert!(json["data"]["results"]
        .as_array()
        .unwrap()
        .iter()
        .all(|r| r["provider"] == "bing"));
}

#[tokio::test]
async fn search_rejects_bad_input() {
    let app: common::TestApp = common::spawn_app().await;

    let empty: reqwest::Response = app
        .post("/api/v1/search")
        .json(&json!({ "query": "   " }))
        .send()
        .await
        .unwrap();
    assert_eq!(empty.status(), StatusCode::BAD_REQUEST);

    let too_many: reqwest::Response = app
        .post("/api/v1/search")
        .json(&json!({ "query": "rust", "num_results": 1000 }))
        .send()
        .await
        .unwrap();
    assert_eq!(too_many.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn analyze_detects_intent() {
    let app: common::TestApp = common::spawn_app().await;

    let resp: reqwest::Response = app
        .get("/api/v1/search/analyze?query=how%20to%20bake%20bread")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let json: Value = common::envelope(resp).await;
    assert_eq!(json["data"]["text"], "how to bake bread");
    assert!(json["data"]["intent"].is_string());
}

#[tokio::test]
async fn trends_validate_limit() {
    let app: common::TestApp = common::spawn_app().await;

    let ok: reqwest::Response = app.get("/api/v1/search/trends?limit=3").send().await.unwrap();
    assert_eq!(ok.status(), StatusCode::OK);
    let json: Value = common::envelope(ok).await;
    assert!(json["data"].is_object());

    let bad: reqwest::Response = app.get("/api/v1/search/trends?limit=0").send().await.unwrap();
    assert_eq!(bad.status(), StatusCode::BAD_REQUEST);
}
