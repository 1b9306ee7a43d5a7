//! tests/global_errors/503.rs
//! Ensures a search without configured providers maps to 503.

#[path = "../mod.rs"]
mod common;

use reqwest::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn returns_503_when_no_provider_is_configured() {
    let app: common::TestApp = common::spawn_app_with(&[], Vec::new()).await;

    let resp: reqwest::Response = app
        .post("/api/v1/search")
        .json(&json!({ "query": "rust" }))
        .send()
        .await
        .expect("Failed to make request.");

    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);

    let json: Value = common::envelope(resp).await;
    assert_eq!(json["status"], "SERVICE_UNAVAILABLE");
    assert_eq!(json["code"], 503);
    assert!(!json["messages"].as_array().unwrap().is_empty());
}
