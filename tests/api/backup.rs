//! tests/api/backup.rs
//! Backup jobs, downloads and restores.

#[path = "../mod.rs"]
mod common;

use std::time::Duration;

use reqwest::StatusCode;
use serde_json::{json, Value};

use llamasearch::services::backup::{decode_archive, BackupArchive};

/// Polls `path` until `data.status` leaves pending/running.
async fn wait_until_done(app: &common::TestApp, path: &str) -> Value {
    let mut last: Value = Value::Null;
    for _ in 0..100 {
        last = common::envelope(app.get(path).send().await.unwrap()).await["data"].clone();
        if last["status"] != "pending" && last["status"] != "running" {
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    last
}

async fn seed_vectors(app: &common::TestApp) {
    let resp: reqwest::Response = app
        .post("/api/v1/vector/upsert")
        .json(&json!({
            "collection": "docs",
            "create_collection": true,
            "vectors": [{ "id": "a", "vector": [1.0, 0.0] }, { "id": "b", "vector": [0.0, 1.0] }]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn backup_download_and_restore_round_trip() {
    let app: common::TestApp = common::spawn_app().await;
    seed_vectors(&app).await;

    let created: reqwest::Response = app
        .post("/api/v1/backup/jobs")
        .json(&json!({ "backup_type": "full", "description": "nightly" }))
        .send()
        .await
        .unwrap();
    assert_eq!(created.status(), StatusCode::ACCEPTED);
    let id: String = common::envelope(created).await["data"]["id"].as_str().unwrap().to_owned();

    let job: Value = wait_until_done(&app, &format!("/api/v1/backup/jobs/{id}")).await;
    assert_eq!(job["status"], "completed");
    assert!(job["file_path"].as_str().unwrap().starts_with("backups/backup_"));
    assert!(job["file_size_bytes"].as_u64().unwrap() > 0);

    // The download bypasses the envelope
    let download: reqwest::Response = app
        .get(&format!("/api/v1/backup/jobs/{id}/download"))
        .send()
        .await
        .unwrap();
    assert_eq!(download.status(), StatusCode::OK);
    assert_eq!(download.headers()["content-type"], "application/gzip");
    let bytes: Vec<u8> = download.bytes().await.unwrap().to_vec();
    let archive: BackupArchive = decode_archive(&bytes).unwrap();
    assert_eq!(archive.backup_id, id);
    assert!(archive.vectors.is_some());

    // Lose the data, then restore it
    let deleted: reqwest::Response = app.delete("/api/v1/vector/collections/docs").send().await.unwrap();
    assert_eq!(deleted.status(), StatusCode::NO_CONTENT);

    let restore: reqwest::Response = app
        .post("/api/v1/backup/restore")
        .json(&json!({ "source_backup_id": id }))
        .send()
        .await
        .unwrap();
    assert_eq!(restore.status(), StatusCode::ACCEPTED);
    let restore_id: String = common::envelope(restore).await["data"]["id"].as_str().unwrap().to_owned();

    let restored: Value = wait_until_done(&app, &format!("/api/v1/backup/restore/jobs/{restore_id}")).await;
    assert_eq!(restored["status"], "completed");

    let collections: Value = common::envelope(app.get("/api/v1/vector/collections").send().await.unwrap()).await;
    assert_eq!(collections["data"]["collections"][0]["name"], "docs");
    assert_eq!(collections["data"]["collections"][0]["vector_count"], 2);

    let restores: Value = common::envelope(app.get("/api/v1/backup/restore/jobs").send().await.unwrap()).await;
    assert_eq!(restores["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn restore_requires_a_completed_backup() {
    let app: common::TestApp = common::spawn_app().await;

    let resp: reqwest::Response = app
        .post("/api/v1/backup/restore")
        .json(&json!({ "source_backup_id": "does-not-exist" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn deleted_backups_disappear() {
    let app: common::TestApp = common::spawn_app().await;

    let created: Value = common::envelope(
        app.post("/api/v1/backup/jobs")
            .json(&json!({ "backup_type": "scheduler" }))
            .send()
            .await
            .unwrap(),
    )
    .await;
    let id: String = created["data"]["id"].as_str().unwrap().to_owned();
    wait_until_done(&app, &format!("/api/v1/backup/jobs/{id}")).await;

    let listed: Value = common::envelope(app.get("/api/v1/backup/jobs").send().await.unwrap()).await;
    assert_eq!(listed["data"].as_array().unwrap().len(), 1);

    let deleted: reqwest::Response = app.delete(&format!("/api/v1/backup/jobs/{id}")).send().await.unwrap();
    assert_eq!(deleted.status(), StatusCode::NO_CONTENT);

    let gone: reqwest::Response = app.get(&format!("/api/v1/backup/jobs/{id}")).send().await.unwrap();
    assert_eq!(gone.status(), StatusCode::NOT_FOUND);
}
