//! Error handling for the backend API

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// API error types
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Storage temporarily unavailable: {0}")]
    Transient(String),

    #[error("Inconsistent storage state: {0}")]
    Consistency(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Whether the caller may retry the request (with backoff).
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::Transient(_) => true,
            ApiError::Database(e) => is_transient_sqlx(e),
            _ => false,
        }
    }
}

/// Connectivity and timeout failures are retryable; everything else
/// (constraint violations, decode errors) is not.
fn is_transient_sqlx(error: &sqlx::Error) -> bool {
    matches!(
        error,
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_)
    )
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    retryable: bool,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let retryable = self.is_retryable();
        let (status, error_type) = match &self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            ApiError::InvalidInput(_) => (StatusCode::BAD_REQUEST, "invalid_input"),
            ApiError::Transient(_) => (StatusCode::SERVICE_UNAVAILABLE, "storage_transient"),
            ApiError::Consistency(_) => (StatusCode::INTERNAL_SERVER_ERROR, "storage_consistency"),
            ApiError::Database(e) if is_transient_sqlx(e) => {
                (StatusCode::SERVICE_UNAVAILABLE, "storage_transient")
            }
            ApiError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "database_error"),
            ApiError::Migration(_) => (StatusCode::INTERNAL_SERVER_ERROR, "migration_error"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        };

        let body = Json(ErrorResponse {
            error: error_type.to_string(),
            message: self.to_string(),
            retryable,
        });

        (status, body).into_response()
    }
}

/// Result type alias for API operations
pub type Result<T> = std::result::Result<T, ApiError>;
