//! tests/api/scheduler.rs
//! Job CRUD, validation and manual triggers.

#[path = "../mod.rs"]
mod common;

use std::time::Duration;

use reqwest::StatusCode;
use serde_json::{json, Value};

async fn create_log_job(app: &common::TestApp) -> Value {
    let resp: reqwest::Response = app
        .post("/api/v1/scheduler/jobs")
        .json(&json!({
            "task_name": "log",
            "schedule": { "interval_seconds": 3600 },
            "kwargs": { "message": "hello" }
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    common::envelope(resp).await["data"].clone()
}

#[tokio::test]
async fn create_get_update_delete_job() {
    let app: common::TestApp = common::spawn_app().await;

    let job: Value = create_log_job(&app).await;
    let id: &str = job["id"].as_str().unwrap();
    assert_eq!(job["status"], "pending");
    assert!(job["next_run_time"].is_string());

    let fetched: Value = common::envelope(app.get(&format!("/api/v1/scheduler/jobs/{id}")).send().await.unwrap()).await;
    assert_eq!(fetched["data"]["task_name"], "log");

    let updated: Value = common::envelope(
        app.put(&format!("/api/v1/scheduler/jobs/{id}"))
            .json(&json!({ "schedule": { "cron_expression": "*/5 * * * *" } }))
            .send()
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(updated["data"]["schedule"]["cron_expression"], "*/5 * * * *");

    let listed: Value = common::envelope(app.get("/api/v1/scheduler/jobs?status=pending").send().await.unwrap()).await;
    assert_eq!(listed["data"].as_array().unwrap().len(), 1);

    let deleted: reqwest::Response = app.delete(&format!("/api/v1/scheduler/jobs/{id}")).send().await.unwrap();
    assert_eq!(deleted.status(), StatusCode::NO_CONTENT);

    let gone: reqwest::Response = app.get(&format!("/api/v1/scheduler/jobs/{id}")).send().await.unwrap();
    assert_eq!(gone.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invalid_jobs_are_rejected() {
    let app: common::TestApp = common::spawn_app().await;

    let cases: [Value; 5] = [
        json!({ "task_name": "missing_task", "schedule": { "interval_seconds": 10 } }),
        json!({ "task_name": "log", "schedule": {} }),
        json!({ "task_name": "log", "schedule": { "interval_seconds": 10, "cron_expression": "* * * * *" } }),
        json!({ "task_name": "log", "schedule": { "cron_expression": "61 * * * *" } }),
        json!({ "task_name": "log", "schedule": { "cron_expression": "5/4294967295 * * * *" } }),
    ];

    for body in cases {
        let resp: reqwest::Response = app.post("/api/v1/scheduler/jobs").json(&body).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "body: {body}");
    }

    let bad_limit: reqwest::Response = app.get("/api/v1/scheduler/jobs?limit=0").send().await.unwrap();
    assert_eq!(bad_limit.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn trigger_runs_the_job_in_the_background() {
    let app: common::TestApp = common::spawn_app().await;

    let job: Value = create_log_job(&app).await;
    let id: String = job["id"].as_str().unwrap().to_owned();

    let resp: reqwest::Response = app
        .post(&format!("/api/v1/scheduler/jobs/{id}/trigger"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::ACCEPTED);

    let mut last: Value = Value::Null;
    for _ in 0..50 {
        last = common::envelope(app.get(&format!("/api/v1/scheduler/jobs/{id}")).send().await.unwrap()).await["data"].clone();
        if last["run_count"] == 1 && last["status"] == "pending" {
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    // Recurring jobs go back to pending with the task result recorded
    assert_eq!(last["run_count"], 1);
    assert_eq!(last["status"], "pending");
    assert_eq!(last["last_result"]["logged"], "hello");
}

#[tokio::test]
async fn trigger_unknown_job_is_404() {
    let app: common::TestApp = common::spawn_app().await;

    let resp: reqwest::Response = app.post("/api/v1/scheduler/jobs/nope/trigger").send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
