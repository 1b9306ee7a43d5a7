// Start of file: /src/api/search/handler.rs

use std::collections::BTreeMap;

use axum::{
    extract::{Query as QueryParams, State},
    Json,
};
use tracing::{info, instrument};

use crate::config::state::AppState;
use crate::models::search::{AnalyzeParams, Query, SearchRequest, SearchResponse, TrendsParams};
use crate::utils::response_handler::{HandlerResponse, HandlerResult};

/// Runs a metasearch across the configured providers.
#[instrument(name = "search", skip(state, request), fields(query = %request.query.text()))]
pub async fn search_handler(State(state): State<AppState>, Json(request): Json<SearchRequest>) -> HandlerResult {
    let response: SearchResponse = state.search.search(request).await?;
    info!("Search returned {} results", response.results.len());

    Ok(HandlerResponse::ok().json(&response))
}

#[instrument(name = "analyze_query", skip(state))]
pub async fn analyze_handler(
    State(state): State<AppState>,
    QueryParams(params): QueryParams<AnalyzeParams>,
) -> HandlerResult {
    let query: Query = state.search.analyze_query(&params.query)?;
    Ok(HandlerResponse::ok().json(&query))
}

#[instrument(name = "trends", skip(state))]
pub async fn trends_handler(
    State(state): State<AppState>,
    QueryParams(params): QueryParams<TrendsParams>,
) -> HandlerResult {
    let trends: BTreeMap<String, Vec<String>> = state.search.get_trends(params.category.as_deref(), params.limit)?;
    Ok(HandlerResponse::ok().json(&trends))
}

// End of file: /src/api/search/handler.rs
