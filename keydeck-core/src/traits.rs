//! Trait definitions for Keydeck.
//!
//! These are the collaborators the credential panel talks to. Concrete
//! implementations live in `keydeck-fetch` (HTTP) and `keydeck-store`
//! (notifications, i18n); tests supply in-memory ones.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::models::{CredentialRecord, UsageBlob};

/// How a backend persists enablement changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersistMode {
    /// One `set_status` call per record.
    PerItem,
    /// One `save` call carrying the whole list.
    WholeList,
}

/// Source of a credential list.
///
/// Backends implement `set_status` or `save` according to their
/// [`PersistMode`]; the other defaults to [`CoreError::Unsupported`].
#[async_trait]
pub trait CredentialBackend: Send + Sync {
    /// Short label used in logs.
    fn name(&self) -> &str;

    /// How this backend persists changes.
    fn persist_mode(&self) -> PersistMode;

    /// Fetches the current list.
    async fn list(&self) -> Result<Vec<CredentialRecord>, CoreError>;

    /// Persists the disabled flag of one record.
    async fn set_status(&self, id: &str, disabled: bool) -> Result<(), CoreError> {
        let _ = (id, disabled);
        Err(CoreError::Unsupported(format!(
            "{} does not support per-item status updates",
            self.name()
        )))
    }

    /// Persists the whole list.
    async fn save(&self, records: &[CredentialRecord]) -> Result<(), CoreError> {
        let _ = records;
        Err(CoreError::Unsupported(format!(
            "{} does not support saving the whole list",
            self.name()
        )))
    }
}

/// Source of usage statistics.
#[async_trait]
pub trait UsageSource: Send + Sync {
    /// Fetches the raw usage payload.
    async fn usage(&self) -> Result<UsageBlob, CoreError>;
}

/// Notification severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Operation succeeded.
    Success,
    /// Operation partly succeeded.
    Warning,
    /// Operation failed.
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Shows user-facing notifications (toasts).
pub trait Notifier: Send + Sync {
    /// Shows a message.
    fn show(&self, message: &str, severity: Severity);
}

/// Looks up localized strings.
pub trait Translator: Send + Sync {
    /// Returns the text for `key` with `{{name}}` placeholders replaced.
    fn text(&self, key: &str, args: &[(&str, String)]) -> String;
}
