use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// Error response type
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

/// Response type for health check endpoint
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

/// Response type for unhealthy status
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct UnhealthyResponse {
    pub status: String,
    pub error: String,
}

/// Custom error type for API endpoints
///
/// Maps every failure to an HTTP status and a JSON `{"error": ...}` body.
/// Store failures are logged with their full cause but reported to the
/// client with a generic message only.
#[derive(Debug)]
pub enum ApiError {
    /// Request body has the wrong shape or lacks a required field
    InvalidBody(String),
    /// Request body could not be interpreted as the expected JSON type
    JsonError(serde_json::Error),
    /// No career stored under this code
    CareerNotFound(String),
    /// No subject stored under this id
    SubjectNotFound(String),
    /// Any failure talking to the key-value store
    StoreError(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ApiError::InvalidBody(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::JsonError(err) => (
                StatusCode::BAD_REQUEST,
                format!("JSON parse error: {}", err),
            ),
            ApiError::CareerNotFound(codigo) => (
                StatusCode::NOT_FOUND,
                format!("Career not found: {}", codigo),
            ),
            ApiError::SubjectNotFound(id) => (
                StatusCode::NOT_FOUND,
                format!("Subject not found: {}", id),
            ),
            ApiError::StoreError(err) => {
                tracing::error!("Store error: {:#}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error while accessing the data store".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error_message,
        });

        (status, body).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::StoreError(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!("Rejected request body: {}", rejection.body_text());
        ApiError::InvalidBody(rejection.body_text())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::JsonError(err)
    }
}
