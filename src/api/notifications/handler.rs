// Start of file: /src/api/notifications/handler.rs

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use tracing::instrument;

use crate::config::state::AppState;
use crate::models::common::Page;
use crate::models::notification::{Notification, NotificationResult, NotificationStatus};
use crate::utils::response_handler::{HandlerResponse, HandlerResult};

/// Always 202: a failed delivery is reported in the body.
#[instrument(name = "send_notification", skip(state, notification), fields(channel = %notification.channel))]
pub async fn send_handler(State(state): State<AppState>, Json(notification): Json<Notification>) -> HandlerResponse {
    let result: NotificationResult = state.notifications.send_notification(notification).await;
    let message: &str = match result.status {
        NotificationStatus::Failed => "Notification could not be delivered",
        _ => "Notification accepted",
    };

    HandlerResponse::new(StatusCode::ACCEPTED).json(&result).message(message)
}

#[instrument(name = "notification_history", skip(state))]
pub async fn history_handler(State(state): State<AppState>, Query(page): Query<Page>) -> HandlerResult {
    let history: Vec<NotificationResult> = state.notifications.list_sent_notifications(page.limit, page.offset).await?;
    Ok(HandlerResponse::ok().json(&history))
}

// End of file: /src/api/notifications/handler.rs
