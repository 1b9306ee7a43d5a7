// Start of file: /src/api/vector/handler.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::{info, instrument};

use crate::config::state::AppState;
use crate::models::vector::{
    CollectionList, EmbedRequest, EmbedResponse, UpsertVectorsRequest, UpsertVectorsResponse,
    VectorSearchRequest, VectorSearchResponse,
};
use crate::utils::response_handler::{HandlerResponse, HandlerResult};

#[instrument(name = "embed", skip(state, request))]
pub async fn embed_handler(State(state): State<AppState>, Json(request): Json<EmbedRequest>) -> HandlerResult {
    let response: EmbedResponse = state.vector.create_embeddings(request).await?;
    info!("Created {} embeddings", response.embeddings.len());

    Ok(HandlerResponse::ok().json(&response))
}

#[instrument(name = "vector_search", skip(state, request), fields(collection = %request.collection))]
pub async fn search_handler(
    State(state): State<AppState>,
    Json(request): Json<VectorSearchRequest>,
) -> HandlerResult {
    let response: VectorSearchResponse = state.vector.vector_search(request).await?;
    Ok(HandlerResponse::ok().json(&response))
}

#[instrument(name = "upsert_vectors", skip(state, request), fields(collection = %request.collection))]
pub async fn upsert_handler(
    State(state): State<AppState>,
    Json(request): Json<UpsertVectorsRequest>,
) -> HandlerResult {
    let response: UpsertVectorsResponse = state.vector.upsert_vectors(request).await?;
    Ok(HandlerResponse::ok()
        .json(&response)
        .message(format!("Upserted {} vectors", response.inserted_count + response.updated_count)))
}

#[instrument(name = "list_collections", skip(state))]
pub async fn list_collections_handler(State(state): State<AppState>) -> HandlerResponse {
    let collections: CollectionList = state.vector.list_collections().await;
    HandlerResponse::ok().json(&collections)
}

#[instrument(name = "delete_collection", skip(state))]
pub async fn delete_collection_handler(State(state): State<AppState>, Path(name): Path<String>) -> HandlerResult {
    state.vector.delete_collection(&name).await?;
    Ok(HandlerResponse::new(StatusCode::NO_CONTENT))
}

// End of file: /src/api/vector/handler.rs
