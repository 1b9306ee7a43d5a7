//! tests/global_errors/413.rs
//! Ensures that a payload over the configured body limit triggers 413.

#[path = "../mod.rs"]
mod common;

use reqwest::StatusCode;
use serde_json::Value;

#[tokio::test]
async fn returns_413_when_payload_exceeds_global_limit() {
    let app: common::TestApp =
        common::spawn_app_with(&[("LLAMASEARCH_MAX_REQUEST_BODY_SIZE", "1024")], Vec::new()).await;

    // A JSON string slightly larger than the limit
    let oversized_payload: String = format!("{{\"query\": \"{}\"}}", "x".repeat(2048));

    let resp: reqwest::Response = app
        .post("/api/v1/search")
        .header("content-type", "application/json")
        .body(oversized_payload)
        .send()
        .await
        .expect("Failed to send large request.");

    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);

    let json: Value = common::envelope(resp).await;
    assert_eq!(json["status"], "PAYLOAD_TOO_LARGE");
    assert_eq!(json["code"], 413);
}
