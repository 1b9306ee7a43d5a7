//! tests/api/monitor.rs
//! Metrics, service status and the log buffer.

#[path = "../mod.rs"]
mod common;

use reqwest::StatusCode;
use serde_json::Value;

#[tokio::test]
async fn metrics_count_requests() {
    let app: common::TestApp = common::spawn_app().await;

    app.client.get(app.url("/health")).send().await.unwrap();
    app.client.get(app.url("/health")).send().await.unwrap();

    let json: Value = common::envelope(app.get("/api/v1/monitor/metrics").send().await.unwrap()).await;
    let metrics: &Value = &json["data"]["metrics"];

    assert!(metrics["request_count"].as_f64().unwrap() >= 2.0);
    assert_eq!(metrics["vector_count"], 0.0);
    assert_eq!(json["data"]["metadata"]["metrics_source"], "sysinfo");
}

#[tokio::test]
async fn status_lists_every_service() {
    let app: common::TestApp = common::spawn_app().await;

    let json: Value = common::envelope(app.get("/api/v1/monitor/status").send().await.unwrap()).await;
    let data: &Value = &json["data"];

    for name in [
        "api",
        "search_provider_google",
        "search_provider_bing",
        "vector_database",
        "personalization",
        "redis_cache",
        "task_scheduler",
        "notification_service",
    ] {
        assert!(data[name].is_object(), "missing {name}");
    }
    assert_eq!(data["api"]["status"], "ok");
    assert_eq!(data["search_provider_google"]["status"], "ok");
    assert_eq!(data["redis_cache"]["status"], "disabled");
    // The loop is not started in tests
    assert_eq!(data["task_scheduler"]["status"], "degraded");
}

#[tokio::test]
async fn single_service_status_and_unknown_name() {
    let app: common::TestApp = common::spawn_app().await;

    let json: Value = common::envelope(app.get("/api/v1/monitor/status/api").send().await.unwrap()).await;
    assert_eq!(json["data"].as_object().unwrap().len(), 1);

    let missing: reqwest::Response = app.get("/api/v1/monitor/status/teleporter").send().await.unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn logs_validate_limit() {
    let app: common::TestApp = common::spawn_app().await;

    let ok: Value = common::envelope(app.get("/api/v1/monitor/logs?limit=5").send().await.unwrap()).await;
    let count: u64 = ok["data"]["count"].as_u64().unwrap();
    assert!(count <= 5);
    assert_eq!(ok["data"]["logs"].as_array().unwrap().len() as u64, count);

    let bad: reqwest::Response = app.get("/api/v1/monitor/logs?limit=5000").send().await.unwrap();
    assert_eq!(bad.status(), StatusCode::BAD_REQUEST);
}
