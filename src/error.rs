//! Error types for the cache service
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Cache Error Enum ==
/// Unified error type for the cache service.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Key not found in the store
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The backing store failed to complete an operation
    #[error("Store unavailable during {context}: {message}")]
    StoreUnavailable { context: String, message: String },

    /// The backing store did not answer before the deadline
    #[error("Store timed out during {context} after {timeout_ms}ms")]
    Timeout { context: String, timeout_ms: u64 },

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CacheError {
    /// Message sent to clients. Backend error text stays in the logs.
    pub fn client_message(&self) -> String {
        match self {
            CacheError::StoreUnavailable { context, .. } => {
                format!("Store unavailable during {context}")
            }
            other => other.to_string(),
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::NotFound(_) => StatusCode::NOT_FOUND,
            CacheError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            CacheError::StoreUnavailable { .. }
            | CacheError::Timeout { .. }
            | CacheError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let body = Json(ErrorResponse::new(self.client_message()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache service.
pub type Result<T> = std::result::Result<T, CacheError>;
