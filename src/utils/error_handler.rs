// Start of file: /src/utils/error_handler.rs

// * Error mapping: layer errors from tower and domain errors from the services.

use axum::{
    BoxError,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::error::Error;
// * tower's error type for timeouts
use tower::timeout::error::Elapsed;
// * Axum uses http_body_util for length-limiting
use http_body_util::LengthLimitError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::utils::response_handler::HandlerResponse;

/// Maps errors raised by the tower layers to status codes.
pub async fn handle_global_error(err: BoxError) -> impl IntoResponse {
    // 413 if the body was too large
    if err.is::<LengthLimitError>() || find_cause::<LengthLimitError>(&*err).is_some() {
        return StatusCode::PAYLOAD_TOO_LARGE;
    }

    // 408 if the request took too long
    if err.is::<Elapsed>() {
        return StatusCode::REQUEST_TIMEOUT;
    }

    error!("Unhandled layer error: {err}");
    StatusCode::INTERNAL_SERVER_ERROR
}

/// Walks the source chain looking for an error of type `T`.
pub fn find_cause<T: Error + 'static>(err: &dyn Error) -> Option<&T> {
    let mut source: Option<&dyn Error> = err.source();

    while let Some(s) = source {
        if let Some(typed) = s.downcast_ref::<T>() {
            return Some(typed);
        }
        source = s.source();
    }

    None
}

/// Failures a service operation can report to its caller.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    InvalidInput(String),
    #[error("{0}")]
    Unavailable(String),
    #[error("{0}")]
    Conflict(String),
    #[error("Upstream error: {0}")]
    Upstream(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ServiceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ServiceError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ServiceError::Conflict(_) => StatusCode::CONFLICT,
            ServiceError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ServiceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            ServiceError::NotFound(_) => "not_found",
            ServiceError::InvalidInput(_) => "invalid_input",
            ServiceError::Unavailable(_) => "unavailable",
            ServiceError::Conflict(_) => "conflict",
            ServiceError::Upstream(_) => "upstream_error",
            ServiceError::Internal(_) => "internal_error",
        }
    }
}

impl From<ServiceError> for HandlerResponse {
    fn from(err: ServiceError) -> Self {
        // ! Internal details stay in the logs
        let message: String = match &err {
            ServiceError::Internal(inner) => {
                error!("Internal error: {inner:#}");
                "Internal server error".to_owned()
            }
            other => other.to_string(),
        };

        HandlerResponse::new(err.status_code())
            .data(json!({ "error": err.kind() }))
            .message(message)
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        HandlerResponse::from(self).into_response()
    }
}

// End of file: /src/utils/error_handler.rs
