//! Fetch error types.

use keydeck_core::CoreError;
use thiserror::Error;

/// Error type for management API calls.
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Base URL or endpoint could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Authentication failed (missing or wrong management key).
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The server answered with a non-success status.
    #[error("Request failed with status {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Server-provided message, or the status reason.
        message: String,
    },

    /// Invalid response from the server.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl FetchError {
    /// Returns true if the server could not be reached at all.
    pub fn is_connection_error(&self) -> bool {
        match self {
            Self::Http(e) => e.is_connect() || e.is_timeout(),
            _ => false,
        }
    }
}

impl From<FetchError> for CoreError {
    fn from(err: FetchError) -> Self {
        if err.is_connection_error() {
            CoreError::Unavailable(err.to_string())
        } else {
            match err {
                FetchError::Status { message, .. } => CoreError::Backend(message),
                FetchError::InvalidResponse(msg) => CoreError::InvalidData(msg),
                FetchError::Json(e) => CoreError::Serialization(e),
                other => CoreError::Backend(other.to_string()),
            }
        }
    }
}
