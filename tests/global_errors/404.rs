//! tests/global_errors/404.rs
//! Ensures that hitting an unknown route returns HTTP 404.

// Include the helper module defined in tests/mod.rs.
#[path = "../mod.rs"]
mod common;

use reqwest::StatusCode;
use serde_json::Value;

#[tokio::test]
async fn returns_404_for_nonexistent_route() {
    let app: common::TestApp = common::spawn_app().await;

    // Send a GET request to a route that does not exist.
    let resp: reqwest::Response = app
        .client
        .get(app.url("/does-not-exist"))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    // Assert the JSON has the expected structure.
    let json: Value = common::envelope(resp).await;
    assert_eq!(json["status"], "NOT_FOUND");
    assert_eq!(json["code"], 404);
    assert!(json["date"].is_string());
}

#[tokio::test]
async fn disabled_feature_routes_are_not_mounted() {
    let app: common::TestApp =
        common::spawn_app_with(&[("LLAMASEARCH_FEATURES", r#"{"backup": false}"#)], Vec::new()).await;

    let resp: reqwest::Response = app.get("/api/v1/backup/jobs").send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
