// Start of file: /src/api/personalization/handler.rs

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde_json::json;
use tracing::{info, instrument};

use crate::config::state::AppState;
use crate::models::personalization::{
    PersonalizationRequest, PersonalizationResponse, PreferenceParams, UserFeedbackRequest,
    UserFeedbackResponse, UserPreference, UserPreferenceUpdate, UserProfile,
};
use crate::utils::response_handler::{HandlerResponse, HandlerResult};

/// Re-ranks the supplied content for one user.
#[instrument(name = "rerank", skip(state, request), fields(user_id = %request.user_id, items = request.content.len()))]
pub async fn rerank_handler(
    State(state): State<AppState>,
    Json(request): Json<PersonalizationRequest>,
) -> HandlerResult {
    let response: PersonalizationResponse = state.personalization.personalize_content(request).await?;
    Ok(HandlerResponse::ok().json(&response))
}

#[instrument(name = "get_profile", skip(state))]
pub async fn get_profile_handler(State(state): State<AppState>, Path(user_id): Path<String>) -> HandlerResult {
    let profile: UserProfile = state.personalization.get_user_profile(&user_id).await?;
    Ok(HandlerResponse::ok().json(&profile))
}

#[instrument(name = "update_profile", skip(state, profile))]
pub async fn update_profile_handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(profile): Json<UserProfile>,
) -> HandlerResult {
    let updated: UserProfile = state.personalization.update_user_profile(&user_id, profile).await?;
    Ok(HandlerResponse::ok().json(&updated).message("Profile updated"))
}

#[instrument(name = "feedback", skip(state, request), fields(user_id = %request.user_id, item_id = %request.item_id))]
pub async fn feedback_handler(
    State(state): State<AppState>,
    Json(request): Json<UserFeedbackRequest>,
) -> HandlerResult {
    let response: UserFeedbackResponse = state.personalization.submit_user_feedback(request).await?;
    info!("Feedback {} stored", response.feedback_id);

    Ok(HandlerResponse::ok().json(&response))
}

#[instrument(name = "get_preferences", skip(state))]
pub async fn get_preferences_handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(params): Query<PreferenceParams>,
) -> HandlerResult {
    let preferences: Vec<UserPreference> = state
        .personalization
        .get_user_preferences(&user_id, params.category.as_deref())
        .await?;

    Ok(HandlerResponse::ok().data(json!({
        "user_id": user_id,
        "preferences": preferences,
    })))
}

#[instrument(name = "set_preference", skip(state, update), fields(key = %update.key))]
pub async fn set_preference_handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(update): Json<UserPreferenceUpdate>,
) -> HandlerResult {
    let preference: UserPreference = state.personalization.set_user_preference(&user_id, update).await?;
    Ok(HandlerResponse::ok().json(&preference).message("Preference saved"))
}

// End of file: /src/api/personalization/handler.rs
