//! services/api/src/error.rs
//!
//! Defines the primary error type for the entire API service, and its mapping
//! onto HTTP responses. Every failure body has the shape
//! `{"error": "<message>"}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::{error, warn};

use crate::config::ConfigError;
use comic_courier_core::ports::PortError;

/// The primary error type for the `api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from one of the core service ports.
    #[error("{0}")]
    Port(#[from] PortError),

    /// Represents an error from the underlying database library.
    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The request needs an identified caller and none was supplied.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The request itself was malformed (bad path parameter, invalid field).
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

impl ApiError {
    /// The HTTP status this error maps to.
    ///
    /// Not-found conditions get a real 404 instead of the blanket 500 the
    /// original service answered with; 500 stays reserved for upstream and
    /// internal faults.
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Port(PortError::NotFound(_)) | ApiError::Port(PortError::UserNotFound(_)) => {
                StatusCode::NOT_FOUND
            }
            ApiError::Port(PortError::InvalidRange(_)) | ApiError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Port(PortError::UpstreamUnavailable(_))
            | ApiError::Port(PortError::UpstreamParse(_))
            | ApiError::Port(PortError::Unexpected(_))
            | ApiError::Config(_)
            | ApiError::Database(_)
            | ApiError::Io(_)
            | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();

        if status.is_server_error() {
            error!(%status, "request failed: {message}");
        } else {
            warn!(%status, "request rejected: {message}");
        }

        (status, Json(json!({ "error": message }))).into_response()
    }
}
