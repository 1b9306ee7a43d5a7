//! tests/api/vector.rs
//! Embeddings, upserts, similarity search and collections.

#[path = "../mod.rs"]
mod common;

use reqwest::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn embed_returns_one_vector_per_text() {
    let app: common::TestApp = common::spawn_app().await;

    let json: Value = common::envelope(
        app.post("/api/v1/vector/embed")
            .json(&json!({ "text": ["first text", "second text"] }))
            .send()
            .await
            .unwrap(),
    )
    .await;

    let embeddings: &Vec<Value> = json["data"]["embeddings"].as_array().unwrap();
    assert_eq!(embeddings.len(), 2);
    assert_eq!(json["data"]["metadata"]["batch_size"], 2);
    assert_eq!(
        embeddings[0]["vector"].as_array().unwrap().len() as u64,
        embeddings[0]["dimensions"].as_u64().unwrap()
    );
}

#[tokio::test]
async fn upsert_search_and_delete_collection() {
    let app: common::TestApp = common::spawn_app().await;

    let upsert: Value = common::envelope(
        app.post("/api/v1/vector/upsert")
            .json(&json!({
                "collection": "docs",
                "create_collection": true,
                "vectors": [
                    { "id": "a", "vector": [1.0, 0.0, 0.0], "metadata": { "lang": "en" } },
                    { "id": "b", "vector": [0.0, 1.0, 0.0], "metadata": { "lang": "de" } },
                    { "id": "c", "vector": [0.9, 0.1, 0.0], "metadata": { "lang": "en" } }
                ]
            }))
            .send()
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(upsert["data"]["inserted_count"], 3);

    // Second upsert of the same id is an update
    let again: Value = common::envelope(
        app.post("/api/v1/vector/upsert")
            .json(&json!({ "collection": "docs", "vectors": [{ "id": "a", "vector": [1.0, 0.0, 0.0] }] }))
            .send()
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(again["data"]["updated_count"], 1);

    let search: Value = common::envelope(
        app.post("/api/v1/vector/search")
            .json(&json!({
                "collection": "docs",
                "query": [1.0, 0.0, 0.0],
                "num_results": 5,
                "filter": { "lang": "en" }
            }))
            .send()
            .await
            .unwrap(),
    )
    .await;
    let ids: Vec<&str> = search["data"]["results"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["a", "c"]);
    assert_eq!(search["data"]["metadata"]["filtered_vectors"], 1);

    let list: Value = common::envelope(app.get("/api/v1/vector/collections").send().await.unwrap()).await;
    assert_eq!(list["data"]["total_count"], 1);
    assert_eq!(list["data"]["database_type"], "in_memory");

    let deleted: reqwest::Response = app.delete("/api/v1/vector/collections/docs").send().await.unwrap();
    assert_eq!(deleted.status(), StatusCode::NO_CONTENT);
    assert!(deleted.text().await.unwrap().is_empty());

    let missing: reqwest::Response = app.delete("/api/v1/vector/collections/docs").send().await.unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn upsert_rejects_dimension_mismatch_and_unknown_collection() {
    let app: common::TestApp = common::spawn_app().await;

    let unknown: reqwest::Response = app
        .post("/api/v1/vector/upsert")
        .json(&json!({ "collection": "nope", "vectors": [{ "id": "a", "vector": [1.0] }] }))
        .send()
        .await
        .unwrap();
    assert_eq!(unknown.status(), StatusCode::NOT_FOUND);

    let mismatch: reqwest::Response = app
        .post("/api/v1/vector/upsert")
        .json(&json!({
            "collection": "mixed",
            "create_collection": true,
            "vectors": [{ "id": "a", "vector": [1.0, 0.0] }, { "id": "b", "vector": [1.0, 0.0, 0.0] }]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(mismatch.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_filter_operator_is_rejected() {
    let app: common::TestApp = common::spawn_app().await;

    app.post("/api/v1/vector/upsert")
        .json(&json!({ "collection": "docs", "create_collection": true, "vectors": [{ "id": "a", "vector": [1.0, 0.0] }] }))
        .send()
        .await
        .unwrap();

    let resp: reqwest::Response = app
        .post("/api/v1/vector/search")
        .json(&json!({ "collection": "docs", "query": [1.0, 0.0], "filter": { "x": { "$regex": "a" } } }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
