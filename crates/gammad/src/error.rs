//! Server error types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use crate::a2a::ErrorEnvelope;

/// Errors that can occur in the gamma daemon
#[derive(Debug, Error)]
pub enum ServerError {
    /// Failed to bind to the specified address
    #[error("failed to bind to {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// Request body is not a JSON object
    #[error("invalid request: {0}")]
    BadRequest(String),

    /// `type` names no known A2A request
    #[error("Unknown request type: {0}")]
    UnknownRequestType(String),

    /// Internal server error
    #[error("internal error: {0}")]
    Internal(String),
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::BadRequest(_) | ServerError::UnknownRequestType(_) => {
                StatusCode::BAD_REQUEST
            }
            ServerError::Bind { .. } | ServerError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "a2a request failed");
        } else {
            tracing::warn!(error = %self, "a2a request rejected");
        }
        (status, Json(ErrorEnvelope::new(self.to_string()))).into_response()
    }
}

impl From<serde_json::Error> for ServerError {
    fn from(err: serde_json::Error) -> Self {
        ServerError::Internal(err.to_string())
    }
}
