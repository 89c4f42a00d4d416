//! Per-request error taxonomy.
//!
//! Every variant is terminal for the request that raised it; nothing is
//! retried. Responses carry a short plain-text body while the full detail
//! goes to the log.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RelayError {
    /// No route matched the request.
    #[error("Not found")]
    RouteNotFound,

    /// The TTS engine refused the connection or failed before sending a
    /// response head.
    #[error("Upstream request failed: {0}")]
    Upstream(String),

    /// Bad JSON, missing fields, undecodable payload or unsafe filename.
    #[error("Invalid upload: {0}")]
    MalformedUpload(String),

    #[error("Upload exceeds the {limit} byte limit")]
    PayloadTooLarge { limit: usize },

    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    /// The requested staged file does not exist.
    #[error("File not found")]
    FileNotFound,

    /// All request slots are taken.
    #[error("Server busy")]
    Overloaded,
}

impl RelayError {
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::RouteNotFound | RelayError::FileNotFound => StatusCode::NOT_FOUND,
            RelayError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            RelayError::Overloaded => StatusCode::SERVICE_UNAVAILABLE,
            RelayError::Upstream(_) | RelayError::MalformedUpload(_) | RelayError::Storage(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            RelayError::Upstream(e) => {
                tracing::error!(error = %e, "Proxy error");
                "Proxy error".to_string()
            }
            RelayError::Storage(e) => {
                tracing::error!(error = %e, "Failed to store voice file");
                "Failed to store voice file".to_string()
            }
            RelayError::MalformedUpload(_) | RelayError::PayloadTooLarge { .. } => {
                tracing::warn!(error = %self, "Upload rejected");
                self.to_string()
            }
            RelayError::Overloaded => {
                tracing::warn!("Request rejected, all slots busy");
                self.to_string()
            }
            RelayError::RouteNotFound | RelayError::FileNotFound => {
                tracing::debug!(error = %self, "Not found");
                self.to_string()
            }
        };

        (status, message).into_response()
    }
}
