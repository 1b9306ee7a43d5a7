// Start of file: /src/utils/response_handler.rs

// * Unified response system: handlers return `HandlerResponse`,
// * `response_wrapper` turns every outgoing response into the JSON envelope.

use axum::{
    body::Body,
    http::{
        header::{CONTENT_LENGTH, CONTENT_TYPE},
        response::Parts,
        HeaderValue, Request, Response, StatusCode,
    },
    middleware::Next,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use http_body_util::BodyExt;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::convert::Infallible;
use tracing::{debug, error};

use crate::utils::utils::to_two_space_indented_json;

/// Standard JSON response format for all API endpoints
#[derive(Debug, Serialize, Deserialize)]
pub struct ResponseFormat {
    pub status: String,          // HTTP status text (e.g. "OK", "NOT_FOUND")
    pub code: u16,               // HTTP status code
    pub data: serde_json::Value, // Response payload
    pub messages: Vec<String>,   // Informational messages
    pub date: String,            // RFC3339 timestamp
}

/// Convenience struct for building responses in handlers
#[derive(Debug, Clone)]
pub struct HandlerResponse {
    pub status_code: StatusCode,
    pub data: serde_json::Value,
    pub messages: Vec<String>,
}

/// `Result` alias for handlers: both arms render through the envelope.
pub type HandlerResult = Result<HandlerResponse, HandlerResponse>;

impl HandlerResponse {
    /// Creates a new response with specified status code
    pub fn new(status_code: StatusCode) -> Self {
        Self {
            status_code,
            data: serde_json::Value::Null,
            messages: Vec::new(),
        }
    }

    pub fn ok() -> Self {
        Self::new(StatusCode::OK)
    }

    /// Adds JSON data payload to the response
    pub fn data(mut self, data: serde_json::Value) -> Self {
        self.data = data;
        self
    }

    /// Serializes `value` as the payload
    pub fn json<T: Serialize>(self, value: &T) -> Self {
        match serde_json::to_value(value) {
            Ok(data) => self.data(data),
            Err(err) => {
                error!("Failed to serialize response payload: {err}");
                HandlerResponse::new(StatusCode::INTERNAL_SERVER_ERROR)
                    .message("Failed to serialize response")
            }
        }
    }

    /// Adds an informational message to the response
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.messages.push(message.into());
        self
    }
}

impl IntoResponse for HandlerResponse {
    fn into_response(self) -> axum::response::Response {
        // 204 carries no body, so no envelope either
        if self.status_code == StatusCode::NO_CONTENT {
            return StatusCode::NO_CONTENT.into_response();
        }

        let mut response: Response<Body> = Json(json!({
            "data": self.data,
            "messages": self.messages
        }))
        .into_response();

        *response.status_mut() = self.status_code;

        // * Store HandlerResponse in extensions for middleware processing
        response.extensions_mut().insert(self);
        response
    }
}

/// Marks a response that must leave the server untouched (file downloads).
#[derive(Debug, Clone, Copy)]
pub struct Passthrough;

fn create_default_status_message(parts: &Parts) -> String {
    parts
        .status
        .canonical_reason()
        .unwrap_or("UNKNOWN STATUS")
        .to_string()
}

/// Pulls data and messages out of a response.
/// Responses produced outside `HandlerResponse` (extractor rejections,
/// layer errors) have their body folded into the envelope.
async fn extract_response_components(response: Response<Body>) -> (Parts, Vec<String>, Value) {
    let structured: Option<HandlerResponse> = response.extensions().get::<HandlerResponse>().cloned();
    let (parts, body) = response.into_parts();

    if let Some(r) = structured {
        return (parts, r.messages, r.data);
    }

    let bytes = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(err) => {
            error!("Failed to read response body: {err}");
            return (parts, Vec::new(), Value::Null);
        }
    };

    if bytes.is_empty() {
        return (parts, Vec::new(), Value::Null);
    }

    match serde_json::from_slice::<Value>(&bytes) {
        Ok(value) => (parts, Vec::new(), value),
        Err(_) => {
            let text: String = String::from_utf8_lossy(&bytes).trim().to_owned();
            (parts, vec![text], Value::Null)
        }
    }
}

/// Logs the formatted response with proper JSON indentation
fn log_formatted_response(wrapped: &ResponseFormat) {
    match to_two_space_indented_json(wrapped) {
        Ok(spaced_json) => debug!("\nFinal response:\n{}", spaced_json),
        Err(err) => error!("Failed to format response JSON: {:?}", err),
    }
}

/// Builds the final response with JSON content type
fn build_final_response(parts: Parts, wrapped: &ResponseFormat) -> Response<Body> {
    let json_body: Vec<u8> = serde_json::to_vec(wrapped).unwrap_or_else(|_| b"{}".to_vec());
    let mut new_parts: Parts = parts;

    new_parts
        .headers
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    new_parts.headers.remove(CONTENT_LENGTH);

    Response::from_parts(new_parts, Body::from(json_body))
}

/// Middleware that wraps all responses in the standard ResponseFormat structure
pub async fn response_wrapper(req: Request<Body>, next: Next) -> Result<Response<Body>, Infallible> {
    let response: Response<Body> = next.run(req).await;

    // ? Downloads and empty responses keep their own body
    if response.extensions().get::<Passthrough>().is_some() || response.status() == StatusCode::NO_CONTENT {
        return Ok(response);
    }

    let (parts, messages, data) = extract_response_components(response).await;

    let default_status: String = create_default_status_message(&parts);
    let formatted_status: String = default_status.to_uppercase().replace(' ', "_");

    let wrapped: ResponseFormat = ResponseFormat {
        status: formatted_status,
        code: parts.status.as_u16(),
        data,
        messages,
        date: Utc::now().to_rfc3339(),
    };

    log_formatted_response(&wrapped);

    Ok(build_final_response(parts, &wrapped))
}

// End of file: /src/utils/response_handler.rs
