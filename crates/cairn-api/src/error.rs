//! HTTP error mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};

/// Error type returned by request handlers.
///
/// Maps engine errors onto HTTP status codes; every response body is
/// `{"error": "..."}`.
#[derive(Debug)]
pub enum ApiError {
    /// Engine failure surfaced as 500
    Internal(cairn_core::Error),
    NotFound(String),
    BadRequest(String),
    Conflict(String),
}

impl From<cairn_core::Error> for ApiError {
    fn from(err: cairn_core::Error) -> Self {
        match &err {
            cairn_core::Error::ResourceNotFound(id) => {
                ApiError::NotFound(format!("Resource {} not found", id))
            }
            cairn_core::Error::NotFound(msg) => ApiError::NotFound(msg.clone()),
            cairn_core::Error::InvalidInput(msg) => ApiError::BadRequest(msg.clone()),
            _ => ApiError::Internal(err),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            ApiError::Internal(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
        };

        let body = Json(serde_json::json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}
