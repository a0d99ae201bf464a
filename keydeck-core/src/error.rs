//! Core error types for Keydeck.

use thiserror::Error;

/// Core error type for Keydeck operations.
///
/// Collaborator traits return this type so the panel can report a failure
/// reason without knowing which transport produced it.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The backend rejected or failed the request.
    #[error("Backend error: {0}")]
    Backend(String),

    /// The backend is not reachable.
    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    /// A record id did not match anything in the list.
    #[error("Record not found: {0}")]
    NotFound(String),

    /// The backend does not support this operation.
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// Invalid data from API response.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}
