// crates/server/src/error.rs
use std::fmt;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use dummybox_core::JobError;
use thiserror::Error;

/// Why a request failed the token check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    Missing,
    Invalid,
}

impl fmt::Display for AuthFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthFailure::Missing => f.write_str("token required"),
            AuthFailure::Invalid => f.write_str("invalid token"),
        }
    }
}

/// API error types that map to HTTP status codes.
///
/// Bodies are short plain-text messages; details stay in the server log.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid JSON body: {0}")]
    InvalidBody(#[source] serde_json::Error),

    #[error("Unauthorized: {0}")]
    Unauthorized(AuthFailure),

    #[error(transparent)]
    Job(#[from] JobError),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ApiError::InvalidBody(err) => {
                tracing::warn!(error = %err, "Invalid JSON body");
                (StatusCode::BAD_REQUEST, "Invalid JSON body".to_string())
            }
            ApiError::Unauthorized(reason) => {
                tracing::warn!(reason = %reason, "Unauthorized request");
                (StatusCode::UNAUTHORIZED, format!("Unauthorized: {reason}"))
            }
            ApiError::Job(err) => {
                tracing::error!(error = %err, "Failed to start job");
                (StatusCode::INTERNAL_SERVER_ERROR, err.public_message().to_string())
            }
            ApiError::Internal(msg) => {
                tracing::error!(message = %msg, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        (status, body).into_response()
    }
}

/// Result type alias for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn extract_response(response: Response) -> (StatusCode, String) {
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_invalid_body_returns_400() {
        let err = serde_json::from_str::<serde_json::Value>("{oops").unwrap_err();
        let (status, body) = extract_response(ApiError::InvalidBody(err).into_response()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, "Invalid JSON body");
    }

    #[tokio::test]
    async fn test_unauthorized_returns_401() {
        let (status, body) =
            extract_response(ApiError::Unauthorized(AuthFailure::Missing).into_response()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, "Unauthorized: token required");

        let (_, body) =
            extract_response(ApiError::Unauthorized(AuthFailure::Invalid).into_response()).await;
        assert_eq!(body, "Unauthorized: invalid token");
    }

    #[tokio::test]
    async fn test_job_error_hides_details() {
        let err = JobError::WorkerSpawn(std::io::Error::other("EAGAIN from clone()"));
        let (status, body) = extract_response(ApiError::from(err).into_response()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, "Failed to generate CPU load");
    }

    #[tokio::test]
    async fn test_internal_error_returns_500() {
        let (status, body) =
            extract_response(ApiError::Internal("join error".into()).into_response()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, "Internal server error");
    }

    #[test]
    fn test_api_error_display() {
        let err = ApiError::Internal("oops".to_string());
        assert_eq!(err.to_string(), "Internal server error: oops");
        let err = ApiError::Unauthorized(AuthFailure::Invalid);
        assert_eq!(err.to_string(), "Unauthorized: invalid token");
    }
}
