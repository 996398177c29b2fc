//! services/api/src/error.rs
//!
//! Defines the primary error type for the entire API service, plus the
//! single mapping from the core error taxonomy onto HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use tracing::error;

use crate::config::ConfigError;
use bookshelf_core::ports::PortError;

/// The primary error type for the `api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from one of the core store ports.
    #[error("Store Port Error: {0}")]
    Port(#[from] PortError),

    /// Represents an error from the underlying database library.
    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

/// The rejection type returned by every handler. Wraps a [`PortError`] so
/// the taxonomy-to-status mapping lives in exactly one place.
#[derive(Debug)]
pub struct ApiRejection(pub PortError);

impl From<PortError> for ApiRejection {
    fn from(err: PortError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiRejection {
    fn into_response(self) -> Response {
        let (status, message) = match self.0 {
            PortError::Validation(message) => (StatusCode::UNPROCESSABLE_ENTITY, message),
            PortError::NotFound(message) => (StatusCode::NOT_FOUND, message),
            PortError::Conflict(message) => (StatusCode::CONFLICT, message),
            PortError::Unexpected(detail) => {
                // Full detail stays server-side; the caller gets a generic body.
                error!("Unexpected store error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
        };
        (status, Json(json!({ "message": message }))).into_response()
    }
}
