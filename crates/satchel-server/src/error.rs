//! Error types for the server.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// Server error type.
#[derive(Debug, Error)]
pub enum ServerError {
    /// No session identifier on the request.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),

    /// Failed to bind or serve.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<satchel_session::Error> for ServerError {
    fn from(e: satchel_session::Error) -> Self {
        match e {
            satchel_session::Error::IdentifierNotFound => ServerError::Unauthorized(e.to_string()),
            satchel_session::Error::IdentifierMalformed(_)
            | satchel_session::Error::InvalidArgument(_) => ServerError::BadRequest(e.to_string()),
            satchel_session::Error::SessionNotFound(_) => ServerError::NotFound(e.to_string()),
        }
    }
}

/// Result type for server operations.
pub type Result<T> = std::result::Result<T, ServerError>;

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ServerError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "unauthorized"),
            ServerError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            ServerError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            ServerError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
            ServerError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "io_error"),
        };

        let message = self.to_string();

        match &self {
            ServerError::Internal(_) | ServerError::Io(_) => {
                tracing::error!(status = %status, code, error = %message, "Server error");
            }
            _ => {
                tracing::warn!(status = %status, code, error = %message, "Client error");
            }
        }

        let body = ErrorResponse {
            code: code.to_string(),
            message,
        };

        (status, Json(body)).into_response()
    }
}
