//! Error handling for the bookshelf HTTP layer
//!
//! 400 and 500 responses carry `{"error": ...}`; 404 responses carry
//! `{"message": ...}`. Existing clients depend on both shapes.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

/// Application error types that map to HTTP responses
#[derive(Error, Debug)]
pub enum ApiError {
    /// Path identifier is not in the store's identifier format
    #[error("Invalid {} ID", .resource.to_lowercase())]
    InvalidId { resource: &'static str },

    /// Payload failed field validation
    #[error("{0}")]
    Validation(String),

    /// Request body could not be read as a JSON object
    #[error("{0}")]
    BadRequest(String),

    #[error("{resource} not found")]
    NotFound { resource: &'static str },

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    /// Create an invalid identifier error for `resource` (e.g. `"Book"`)
    pub fn invalid_id(resource: &'static str) -> Self {
        Self::InvalidId { resource }
    }

    /// Create a not found error for `resource` (e.g. `"Book"`)
    pub fn not_found(resource: &'static str) -> Self {
        Self::NotFound { resource }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a bad request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    /// Wrap a failure of the record store
    pub fn store<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Internal(anyhow::Error::new(err))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidId { .. } | ApiError::Validation(_) | ApiError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let error_id = Uuid::new_v4();
        let status = self.status();
        let message = self.to_string();

        if status.is_server_error() {
            tracing::error!(
                error_id = %error_id,
                status_code = %status.as_u16(),
                error = ?self,
                "Request error"
            );
        } else {
            tracing::warn!(
                error_id = %error_id,
                status_code = %status.as_u16(),
                %message,
                "Request rejected"
            );
        }

        let body = match self {
            ApiError::NotFound { .. } => json!({ "message": message }),
            _ => json!({ "error": message }),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use serde_json::Value;

    async fn body_json(error: ApiError) -> (StatusCode, Value) {
        let response = error.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_invalid_id_mapping() {
        let (status, body) = body_json(ApiError::invalid_id("Book")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "Invalid book ID" }));
    }

    #[tokio::test]
    async fn test_not_found_uses_message_key() {
        let (status, body) = body_json(ApiError::not_found("Comment")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "message": "Comment not found" }));
    }

    #[tokio::test]
    async fn test_validation_error_mapping() {
        let (status, body) =
            body_json(ApiError::validation("User validation failed: name: Path `name` is required."))
                .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body,
            json!({ "error": "User validation failed: name: Path `name` is required." })
        );
    }

    #[tokio::test]
    async fn test_internal_error_mapping() {
        let internal_error = anyhow::anyhow!("Database connection failed");
        let (status, body) = body_json(ApiError::Internal(internal_error)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "error": "Database connection failed" }));
    }
}
