//! Error types for scout-discover

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use scout_common::Identity;
use serde_json::json;
use thiserror::Error;

use crate::services::SourceError;

/// Discovery session errors
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// `discover` was already called on this engine
    #[error("Discovery already started on this engine")]
    AlreadyStarted,

    /// The seed's neighbor listing could not be resolved
    #[error("Failed to expand seed {seed}: {source}")]
    Source {
        seed: Identity,
        #[source]
        source: SourceError,
    },
}

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid request or a search already running (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Deleting the results of a running search (403)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// scout-common error
    #[error("Common error: {0}")]
    Common(#[from] scout_common::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg),
            ApiError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                msg,
            ),
            ApiError::Io(ref err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "IO_ERROR",
                err.to_string(),
            ),
            // Validation failures from the common parsers are caller mistakes
            ApiError::Common(scout_common::Error::InvalidInput(msg)) => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg)
            }
            ApiError::Common(ref err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "COMMON_ERROR",
                err.to_string(),
            ),
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
