// Start of file: /src/services/notification.rs

// * Notification delivery. Email and Slack are validated and recorded;
// * webhooks are POSTed for real.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use tokio::sync::RwLock;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::common::{elapsed_ms, Metadata, API_VERSION};
use crate::models::notification::{Notification, NotificationChannel, NotificationResult, NotificationStatus};
use crate::utils::error_handler::ServiceError;
use crate::utils::utils::{clamp_limit, paginate};

const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_HISTORY: usize = 1000;
const NOTIFICATION_SOURCE: &str = "llamasearch-notification-service";

pub struct NotificationService {
    client: reqwest::Client,
    history: RwLock<Vec<NotificationResult>>,
}

impl Default for NotificationService {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationService {
    pub fn new() -> Self {
        let client: reqwest::Client = reqwest::Client::builder()
            .timeout(WEBHOOK_TIMEOUT)
            .build()
            .unwrap_or_default();
        info!("NotificationService initialized.");

        Self {
            client,
            history: RwLock::new(Vec::new()),
        }
    }

    /// Delivery problems are reported in the result, never as an error.
    pub async fn send_notification(&self, notification: Notification) -> NotificationResult {
        let started: Instant = Instant::now();
        let notification_id: String = Uuid::new_v4().to_string();
        let now: DateTime<Utc> = Utc::now();

        info!(
            "Attempting to send notification {notification_id} via {} to {}",
            notification.channel, notification.recipient
        );

        let outcome: Result<(), String> = match notification.channel {
            NotificationChannel::Email => validate_email(&notification.recipient),
            NotificationChannel::Slack => validate_slack(&notification.recipient),
            NotificationChannel::Webhook => match validate_webhook(&notification.recipient) {
                Ok(()) => self.post_webhook(&notification_id, &notification).await,
                Err(err) => Err(err),
            },
        };

        let (status, error_message) = match outcome {
            Ok(()) => {
                info!("Sent {} notification {notification_id}", notification.channel);
                (NotificationStatus::Sent, None)
            }
            Err(err) => {
                warn!("Failed sending {} notification {notification_id}: {err}", notification.channel);
                (NotificationStatus::Failed, Some(err))
            }
        };

        // * Reuse the caller's request id when provided
        let request_id: String = notification
            .metadata
            .get("request_id")
            .and_then(Value::as_str)
            .map(str::to_owned)
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let result: NotificationResult = NotificationResult {
            notification_id,
            status,
            timestamp: now,
            channel: notification.channel,
            recipient: notification.recipient,
            error_message,
            metadata: Metadata {
                processing_time: elapsed_ms(started),
                timestamp: now,
                request_id,
                source: Some(NOTIFICATION_SOURCE.to_owned()),
                version: Some(API_VERSION.to_owned()),
            },
        };

        let mut history = self.history.write().await;
        history.push(result.clone());
        if history.len() > MAX_HISTORY {
            let excess: usize = history.len() - MAX_HISTORY;
            history.drain(..excess);
        }

        result
    }

    async fn post_webhook(&self, notification_id: &str, notification: &Notification) -> Result<(), String> {
        let payload: Value = json!({
            "notification_id": notification_id,
            "subject": notification.subject,
            "message": notification.message,
            "priority": notification.priority,
            "metadata": notification.metadata,
        });

        let response: reqwest::Response = self
            .client
            .post(&notification.recipient)
            .json(&payload)
            .send()
            .await
            .map_err(|e| format!("Webhook request failed: {e}"))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(format!("Webhook responded with status {}", response.status().as_u16()))
        }
    }

    /// Newest first.
    pub async fn list_sent_notifications(&self, limit: usize, offset: usize) -> Result<Vec<NotificationResult>, ServiceError> {
        if limit == 0 || limit > MAX_HISTORY {
            return Err(ServiceError::InvalidInput(format!("limit must be between 1 and {MAX_HISTORY}")));
        }

        let newest_first: Vec<NotificationResult> = self.history.read().await.iter().rev().cloned().collect();
        Ok(paginate(newest_first, offset, clamp_limit(limit, MAX_HISTORY)))
    }

    pub async fn history_len(&self) -> usize {
        self.history.read().await.len()
    }
}

fn validate_email(recipient: &str) -> Result<(), String> {
    match recipient.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err("Invalid recipient format for email.".to_owned()),
    }
}

fn validate_webhook(recipient: &str) -> Result<(), String> {
    if recipient.starts_with("http://") || recipient.starts_with("https://") {
        Ok(())
    } else {
        Err("Invalid recipient format for webhook (must be URL).".to_owned())
    }
}

fn validate_slack(recipient: &str) -> Result<(), String> {
    if recipient.trim().is_empty() {
        Err("Slack recipient must not be empty.".to_owned())
    } else {
        Ok(())
    }
}

// End of file: /src/services/notification.rs

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::notification::NotificationPriority;
    use serde_json::Map;

    fn notification(channel: NotificationChannel, recipient: &str) -> Notification {
        Notification {
            channel,
            recipient: recipient.into(),
            subject: Some("Subject".into()),
            message: "Body".into(),
            priority: NotificationPriority::Normal,
            metadata: Map::new(),
        }
    }

    #[tokio::test]
    async fn email_needs_an_at_sign() {
        let service: NotificationService = NotificationService::new();

        let sent: NotificationResult = service.send_notification(notification(NotificationChannel::Email, "a@b.io")).await;
        assert_eq!(sent.status, NotificationStatus::Sent);

        let failed: NotificationResult = service.send_notification(notification(NotificationChannel::Email, "nobody")).await;
        assert_eq!(failed.status, NotificationStatus::Failed);
        assert!(failed.error_message.is_some());
    }

    #[tokio::test]
    async fn webhook_requires_http_url() {
        let service: NotificationService = NotificationService::new();
        let failed: NotificationResult =
            service.send_notification(notification(NotificationChannel::Webhook, "ftp://example.com")).await;
        assert_eq!(failed.status, NotificationStatus::Failed);
    }

    #[tokio::test]
    async fn request_id_is_reused_and_history_is_newest_first() {
        let service: NotificationService = NotificationService::new();
        let mut first: Notification = notification(NotificationChannel::Slack, "#ops");
        first.metadata.insert("request_id".into(), Value::from("req-42"));

        let result: NotificationResult = service.send_notification(first).await;
        assert_eq!(result.metadata.request_id, "req-42");

        service.send_notification(notification(NotificationChannel::Slack, "#dev")).await;
        let history: Vec<NotificationResult> = service.list_sent_notifications(10, 0).await.unwrap();
        assert_eq!(history[0].recipient, "#dev");
        assert_eq!(history[1].recipient, "#ops");
    }
}
