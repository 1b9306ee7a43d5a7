//! tests/api/personalization.rs
//! Re-ranking, profiles, feedback and preferences.

#[path = "../mod.rs"]
mod common;

use reqwest::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn rerank_boosts_topics_of_interest() {
    let app: common::TestApp = common::spawn_app().await;

    let put: reqwest::Response = app
        .put("/api/v1/personalization/profile/alice")
        .json(&json!({ "user_id": "alice", "topics_of_interest": ["rust", "ownership"] }))
        .send()
        .await
        .unwrap();
    assert_eq!(put.status(), StatusCode::OK);

    let json: Value = common::envelope(
        app.post("/api/v1/personalization/rerank")
            .json(&json!({
                "user_id": "alice",
                "content": [
                    { "id": "x", "title": "Python tips", "score": 0.6 },
                    { "id": "y", "title": "Rust ownership explained", "score": 0.5 }
                ],
                "context": { "query": "borrow checker" }
            }))
            .send()
            .await
            .unwrap(),
    )
    .await;

    let order: Vec<&str> = json["data"]["content"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["id"].as_str().unwrap())
        .collect();
    assert_eq!(order, vec!["y", "x"]);

    let boosted: &Value = &json["data"]["results"][1];
    assert_eq!(boosted["id"], "y");
    assert_eq!(boosted["rank_change"], -1);
    assert!(boosted["explanation"]["topic_relevance"].as_f64().unwrap() > 0.0);
    assert_eq!(json["data"]["metadata"]["model_version"], "personalization-v1");

    // A profile saved without a privacy level is medium, so the query is kept
    let profile: Value =
        common::envelope(app.get("/api/v1/personalization/profile/alice").send().await.unwrap()).await;
    assert_eq!(profile["data"]["search_history"][0]["query"], "borrow checker");
}

#[tokio::test]
async fn high_privacy_keeps_no_history() {
    let app: common::TestApp = common::spawn_app().await;

    app.post("/api/v1/personalization/rerank")
        .json(&json!({
            "user_id": "carol",
            "content": [{ "id": "x", "title": "Anything" }],
            "context": { "query": "private matter" }
        }))
        .send()
        .await
        .unwrap();

    let profile: Value =
        common::envelope(app.get("/api/v1/personalization/profile/carol").send().await.unwrap()).await;
    assert_eq!(profile["data"]["privacy_level"], "high");
    assert_eq!(profile["data"]["search_history"], json!([]));
}

#[tokio::test]
async fn profile_path_and_body_must_agree() {
    let app: common::TestApp = common::spawn_app().await;

    let resp: reqwest::Response = app
        .put("/api/v1/personalization/profile/alice")
        .json(&json!({ "user_id": "bob" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_user_gets_an_empty_profile() {
    let app: common::TestApp = common::spawn_app().await;

    let json: Value =
        common::envelope(app.get("/api/v1/personalization/profile/newcomer").send().await.unwrap()).await;
    assert_eq!(json["data"]["user_id"], "newcomer");
    assert_eq!(json["data"]["privacy_level"], "high");
    assert_eq!(json["data"]["search_history"], json!([]));
}

#[tokio::test]
async fn feedback_rating_is_validated() {
    let app: common::TestApp = common::spawn_app().await;

    let ok: Value = common::envelope(
        app.post("/api/v1/personalization/feedback")
            .json(&json!({ "user_id": "alice", "item_id": "doc-1", "rating": 4 }))
            .send()
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(ok["data"]["status"], "success");
    assert!(ok["data"]["feedback_id"].is_string());

    let bad: reqwest::Response = app
        .post("/api/v1/personalization/feedback")
        .json(&json!({ "user_id": "alice", "item_id": "doc-1", "rating": 9 }))
        .send()
        .await
        .unwrap();
    assert_eq!(bad.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn preferences_filter_by_category() {
    let app: common::TestApp = common::spawn_app().await;

    for (key, category) in [("theme", "ui"), ("safe_search", "search")] {
        let resp: reqwest::Response = app
            .put("/api/v1/personalization/preferences/alice")
            .json(&json!({ "key": key, "value": true, "category": category }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    let json: Value = common::envelope(
        app.get("/api/v1/personalization/preferences/alice?category=ui")
            .send()
            .await
            .unwrap(),
    )
    .await;
    let prefs: &Vec<Value> = json["data"]["preferences"].as_array().unwrap();
    assert_eq!(prefs.len(), 1);
    assert_eq!(prefs[0]["key"], "theme");

    // Mirrored into the profile
    let profile: Value =
        common::envelope(app.get("/api/v1/personalization/profile/alice").send().await.unwrap()).await;
    assert_eq!(profile["data"]["preferences"]["safe_search"], true);
}

#[tokio::test]
async fn disabled_personalization_is_unavailable() {
    let app: common::TestApp =
        common::spawn_app_with(&[("LLAMASEARCH_PERSONALIZATION_ENABLED", "false")], Vec::new()).await;

    let resp: reqwest::Response = app
        .post("/api/v1/personalization/rerank")
        .json(&json!({ "user_id": "alice", "content": [] }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
}
