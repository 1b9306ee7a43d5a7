//! tests/global_errors/401.rs
//! Ensures every `/api/v1` route demands a valid API key.

#[path = "../mod.rs"]
mod common;

use reqwest::StatusCode;
use serde_json::Value;

#[tokio::test]
async fn returns_401_without_api_key() {
    let app: common::TestApp = common::spawn_app().await;

    let resp: reqwest::Response = app
        .client
        .get(app.url("/api/v1/validate"))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let json: Value = common::envelope(resp).await;
    assert_eq!(json["status"], "UNAUTHORIZED");
    assert_eq!(json["code"], 401);
    assert_eq!(json["data"]["error"], "missing_api_key");
}

#[tokio::test]
async fn returns_401_for_unknown_key() {
    let app: common::TestApp = common::spawn_app().await;

    let resp: reqwest::Response = app
        .client
        .get(app.url("/api/v1/validate"))
        .header("X-API-Key", "wrong")
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let json: Value = common::envelope(resp).await;
    assert_eq!(json["data"]["error"], "invalid_api_key");
}

#[tokio::test]
async fn health_needs_no_key() {
    let app: common::TestApp = common::spawn_app().await;

    let resp: reqwest::Response = app.client.get(app.url("/health")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let json: Value = common::envelope(resp).await;
    assert_eq!(json["data"]["status"], "ok");
}
