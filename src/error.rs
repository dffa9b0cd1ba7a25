//! API error taxonomy and HTTP mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::llm::CompletionError;
use crate::session::StoreError;

/// Request handler failures, mapped onto HTTP statuses.
///
/// Handlers convert every failure into one of these variants at their own
/// boundary; no stack trace or internal detail beyond the message leaves the
/// process.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Missing identity or current-chat reference.
    #[error("Session expired. Please refresh the page.")]
    Unauthorized,

    /// Malformed or empty input.
    #[error("{0}")]
    BadRequest(String),

    /// The chat id does not resolve for this user.
    #[error("Chat not found")]
    NotFound,

    /// Completion failure or other unexpected error.
    #[error("{0}")]
    Internal(String),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::ThreadNotFound => Self::NotFound,
        }
    }
}

impl From<CompletionError> for ApiError {
    fn from(err: CompletionError) -> Self {
        Self::Internal(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(json!({
            "success": false,
            "error": self.to_string(),
        }));
        (status, body).into_response()
    }
}
