//! tests/api/notifications.rs
//! Sending notifications and reading the history.

#[path = "../mod.rs"]
mod common;

use std::sync::{Arc, Mutex};

use axum::{routing::post, Json, Router};
use reqwest::StatusCode;
use serde_json::{json, Value};

type Received = Arc<Mutex<Vec<Value>>>;

async fn send_webhook(app: &common::TestApp, recipient: &str) -> Value {
    let resp: reqwest::Response = app
        .post("/api/v1/notifications/send")
        .json(&json!({
            "channel": "webhook",
            "recipient": recipient,
            "subject": "Deploy",
            "message": "v2 is live",
            "priority": "high",
            "metadata": { "build": 42 }
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::ACCEPTED);
    common::envelope(resp).await["data"].clone()
}

#[tokio::test]
async fn webhook_posts_the_payload_to_the_receiver() {
    let received: Received = Arc::new(Mutex::new(Vec::new()));
    let sink: Received = received.clone();
    let router: Router = Router::new().route(
        "/hook",
        post(move |Json(body): Json<Value>| async move {
            sink.lock().unwrap().push(body);
            axum::http::StatusCode::OK
        }),
    );
    let base: String = common::spawn_stub(router).await;
    let app: common::TestApp = common::spawn_app().await;

    let result: Value = send_webhook(&app, &format!("{base}/hook")).await;
    assert_eq!(result["status"], "sent");
    assert!(result["error_message"].is_null());

    let bodies: Vec<Value> = received.lock().unwrap().clone();
    assert_eq!(bodies.len(), 1);
    assert_eq!(bodies[0]["notification_id"], result["notification_id"]);
    assert_eq!(bodies[0]["subject"], "Deploy");
    assert_eq!(bodies[0]["message"], "v2 is live");
    assert_eq!(bodies[0]["priority"], "high");
    assert_eq!(bodies[0]["metadata"]["build"], 42);
}

#[tokio::test]
async fn webhook_failures_are_reported_in_the_result() {
    let router: Router = Router::new().route("/hook", post(|| async { axum::http::StatusCode::SERVICE_UNAVAILABLE }));
    let base: String = common::spawn_stub(router).await;
    let app: common::TestApp = common::spawn_app().await;

    let rejected: Value = send_webhook(&app, &format!("{base}/hook")).await;
    assert_eq!(rejected["status"], "failed");
    assert!(rejected["error_message"].as_str().unwrap().contains("503"));

    let unreachable: Value = send_webhook(&app, &format!("{}/hook", common::closed_address().await)).await;
    assert_eq!(unreachable["status"], "failed");
    assert!(unreachable["error_message"].as_str().unwrap().contains("Webhook request failed"));
}

#[tokio::test]
async fn send_is_accepted_even_when_delivery_fails() {
    let app: common::TestApp = common::spawn_app().await;

    let sent: reqwest::Response = app
        .post("/api/v1/notifications/send")
        .json(&json!({ "channel": "email", "recipient": "ops@example.com", "message": "Disk almost full" }))
        .send()
        .await
        .unwrap();
    assert_eq!(sent.status(), StatusCode::ACCEPTED);
    let sent: Value = common::envelope(sent).await;
    assert_eq!(sent["data"]["status"], "sent");

    let failed: reqwest::Response = app
        .post("/api/v1/notifications/send")
        .json(&json!({
            "channel": "webhook",
            "recipient": "not-a-url",
            "message": "ping",
            "metadata": { "request_id": "req-7" }
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(failed.status(), StatusCode::ACCEPTED);
    let failed: Value = common::envelope(failed).await;
    assert_eq!(failed["data"]["status"], "failed");
    assert!(failed["data"]["error_message"].is_string());
    assert_eq!(failed["data"]["metadata"]["request_id"], "req-7");

    let history: Value = common::envelope(app.get("/api/v1/notifications/history").send().await.unwrap()).await;
    let items: &Vec<Value> = history["data"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["channel"], "webhook");
}

#[tokio::test]
async fn unknown_channel_is_rejected() {
    let app: common::TestApp = common::spawn_app().await;

    let resp: reqwest::Response = app
        .post("/api/v1/notifications/send")
        .json(&json!({ "channel": "pigeon", "recipient": "x", "message": "y" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}
