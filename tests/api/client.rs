//! tests/api/client.rs
//! The typed client against a live server.

#[path = "../mod.rs"]
mod common;

use serde_json::Map;

use llamasearch::client::{ClientError, SearchClient, SearchHit};
use llamasearch::models::backup::{BackupJob, BackupType};
use llamasearch::models::scheduler::{JobCreate, Schedule};

#[tokio::test]
async fn client_validates_keys() {
    let app: common::TestApp = common::spawn_app().await;

    let good: SearchClient = SearchClient::new(&app.address, Some(common::API_KEY.to_owned())).unwrap();
    assert!(good.validate().await.unwrap());

    let bad: SearchClient = SearchClient::new(&app.address, Some("nope".to_owned())).unwrap();
    assert!(!bad.validate().await.unwrap());
}

#[tokio::test]
async fn client_search_returns_hits() {
    let app: common::TestApp = common::spawn_app().await;
    let client: SearchClient = SearchClient::new(&app.address, Some(common::API_KEY.to_owned())).unwrap();

    let hits: Vec<SearchHit> = client.search("rust", 2).await.unwrap();
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].url, "https://a.example.com/");
    assert_eq!(hits[0].score, 1.0);
}

#[tokio::test]
async fn client_surfaces_api_errors() {
    let app: common::TestApp = common::spawn_app().await;
    let client: SearchClient = SearchClient::new(&app.address, Some(common::API_KEY.to_owned())).unwrap();

    let err: ClientError = client
        .schedule(JobCreate {
            task_name: "unknown".to_owned(),
            schedule: Schedule {
                interval_seconds: Some(5),
                ..Default::default()
            },
            args: Vec::new(),
            kwargs: Map::new(),
            timeout_seconds: 30,
            max_retries: 0,
            retry_delay_seconds: 1,
        })
        .await
        .unwrap_err();

    match err {
        ClientError::Api { status, messages } => {
            assert_eq!(status, 400);
            assert!(!messages.is_empty());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn client_starts_backups() {
    let app: common::TestApp = common::spawn_app().await;
    let client: SearchClient = SearchClient::new(&app.address, Some(common::API_KEY.to_owned())).unwrap();

    let job: BackupJob = client.backup(BackupType::Vectors, None).await.unwrap();
    assert_eq!(job.backup_type, BackupType::Vectors);
}
