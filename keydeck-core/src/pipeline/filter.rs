//! Search, status, and prefix filtering.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::models::CredentialRecord;

/// Status filter options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusFilter {
    /// Keep everything.
    #[default]
    All,
    /// Keep enabled records.
    Active,
    /// Keep disabled records.
    Disabled,
}

impl StatusFilter {
    fn keeps(self, record: &CredentialRecord) -> bool {
        match self {
            Self::All => true,
            Self::Active => !record.disabled,
            Self::Disabled => record.disabled,
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => write!(f, "all"),
            Self::Active => write!(f, "active"),
            Self::Disabled => write!(f, "disabled"),
        }
    }
}

impl FromStr for StatusFilter {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "all" => Ok(Self::All),
            "active" | "enabled" => Ok(Self::Active),
            "disabled" => Ok(Self::Disabled),
            other => Err(CoreError::InvalidData(format!("unknown status filter: {other}"))),
        }
    }
}

/// Filter inputs. The filtered list is always derived from these, never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterState {
    /// Free-text query.
    pub search_text: String,
    /// Status filter.
    pub status_filter: StatusFilter,
    /// Exact prefix to match, for lists that carry prefixes.
    pub prefix_filter: Option<String>,
}

impl FilterState {
    /// Sets the search text.
    pub fn with_search(mut self, text: impl Into<String>) -> Self {
        self.search_text = text.into();
        self
    }

    /// Sets the status filter.
    pub fn with_status(mut self, status: StatusFilter) -> Self {
        self.status_filter = status;
        self
    }

    /// Sets the prefix filter.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix_filter = Some(prefix.into());
        self
    }

    /// Returns true if no stage narrows the list.
    pub fn is_noop(&self) -> bool {
        self.query().is_none() && self.status_filter == StatusFilter::All && self.prefix().is_none()
    }

    fn query(&self) -> Option<String> {
        let query = self.search_text.trim().to_lowercase();
        (!query.is_empty()).then_some(query)
    }

    fn prefix(&self) -> Option<&str> {
        self.prefix_filter
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
    }
}

/// Applies search, then status, then prefix filtering.
///
/// Each stage only removes records; relative order is preserved. Empty
/// search text and an empty prefix are no-ops.
pub fn filter(records: &[CredentialRecord], state: &FilterState) -> Vec<CredentialRecord> {
    let query = state.query();
    let prefix = state.prefix();

    records
        .iter()
        .filter(|record| match &query {
            Some(query) => record
                .search_fields()
                .iter()
                .any(|field| field.to_lowercase().contains(query.as_str())),
            None => true,
        })
        .filter(|record| state.status_filter.keeps(record))
        .filter(|record| match prefix {
            Some(prefix) => record.prefix().map(str::trim) == Some(prefix),
            None => true,
        })
        .cloned()
        .collect()
}
