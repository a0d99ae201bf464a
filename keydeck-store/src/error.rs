//! Store error types.

use thiserror::Error;

/// Errors that can occur in the store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The credential list could not be loaded.
    #[error("Failed to load credentials: {0}")]
    Load(String),

    /// Usage statistics could not be loaded.
    #[error("Failed to load usage statistics: {0}")]
    Stats(String),

    /// An enable/disable change could not be persisted.
    #[error("Failed to update credentials: {0}")]
    Mutation(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl StoreError {
    /// Returns true if retrying (refresh or re-toggle) might succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            StoreError::Load(_) | StoreError::Stats(_) | StoreError::Mutation(_) | StoreError::Io(_)
        )
    }
}
