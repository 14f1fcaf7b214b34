//! Error types for the calendar service
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

/// Message shown to clients when the data source cannot be reached.
pub const UNAVAILABLE_MESSAGE: &str = "Database connection error. Please try again later.";

// == App Error Enum ==
/// Unified error type for the calendar service.
#[derive(Error, Debug)]
pub enum AppError {
    /// Malformed input from the client
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Requested resource does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Data source could not be reached (connection-class failure)
    #[error("Data source unavailable: {0}")]
    Unavailable(String),

    /// Any other data source query failure
    #[error("Database error: {0}")]
    Database(String),

    /// Cache backend failure
    #[error("Cache error: {0}")]
    Cache(String),

    /// Failure producing a cache entry or hash payload
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status used when this error reaches a client.
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unavailable(_)
            | AppError::Database(_)
            | AppError::Cache(_)
            | AppError::Serialization(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show to a client.
    ///
    /// Server-side failures get a generic message; the detail stays in the logs.
    pub fn public_message(&self) -> String {
        match self {
            AppError::InvalidRequest(msg) | AppError::NotFound(msg) => msg.clone(),
            AppError::Unavailable(_) => UNAVAILABLE_MESSAGE.to_string(),
            AppError::Database(_) => "Unable to load data. Please refresh the page.".to_string(),
            AppError::Cache(_) | AppError::Serialization(_) | AppError::Internal(_) => {
                "Internal server error".to_string()
            }
        }
    }
}

// == Conversions ==
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => AppError::NotFound("row not found".to_string()),
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => AppError::Unavailable(err.to_string()),
            other => AppError::Database(other.to_string()),
        }
    }
}

impl From<redis::RedisError> for AppError {
    fn from(err: redis::RedisError) -> Self {
        AppError::Cache(err.to_string())
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(ErrorResponse::from(&self));
        (self.status(), body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the calendar service.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_errors_are_unavailable() {
        let err: AppError = sqlx::Error::PoolTimedOut.into();
        assert!(matches!(err, AppError::Unavailable(_)));
        assert_eq!(err.public_message(), UNAVAILABLE_MESSAGE);
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_other_query_errors_are_database_errors() {
        let err: AppError = sqlx::Error::ColumnNotFound("tier".to_string()).into();
        assert!(matches!(err, AppError::Database(_)));
        assert!(!err.public_message().contains("tier"));
    }

    #[test]
    fn test_client_errors_keep_their_message() {
        let err = AppError::InvalidRequest("Invalid game ID".to_string());
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.public_message(), "Invalid game ID");

        let err = AppError::NotFound("Calendar not found".to_string());
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_response_body_carries_public_message_only() {
        let err = AppError::Database("relation \"matches\" does not exist".to_string());
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json.as_object().map(|o| o.len()), Some(1));
        assert!(!json["error"].as_str().unwrap().contains("relation"));
    }
}
