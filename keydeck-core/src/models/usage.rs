//! Usage-related types.
//!
//! This module contains types related to request statistics:
//! - [`UsageBlob`] - Raw usage payload (apis → models → details)
//! - [`UsageStat`] - One request outcome, flattened from the blob
//! - [`StatBucket`] - Success/failure counters
//! - [`KeyStats`] - Buckets aggregated by source and auth index
//! - [`UsageStats`] - Everything the list needs from the usage endpoint

use std::collections::{BTreeMap, HashMap};
use std::ops::{Add, AddAssign};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

// ============================================================================
// Stat Bucket
// ============================================================================

/// Success and failure counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatBucket {
    /// Successful requests.
    pub success: u64,
    /// Failed requests.
    pub failure: u64,
}

impl StatBucket {
    /// Creates a bucket with the given counts.
    pub fn new(success: u64, failure: u64) -> Self {
        Self { success, failure }
    }

    /// Total requests counted.
    pub fn total(&self) -> u64 {
        self.success.saturating_add(self.failure)
    }

    /// Returns true if nothing was counted.
    pub fn is_empty(&self) -> bool {
        self.success == 0 && self.failure == 0
    }

    /// Counts one request outcome.
    pub fn record(&mut self, success: bool) {
        if success {
            self.success = self.success.saturating_add(1);
        } else {
            self.failure = self.failure.saturating_add(1);
        }
    }

    /// Success rate as a percentage, or `None` when empty.
    #[allow(clippy::cast_precision_loss)]
    pub fn success_rate(&self) -> Option<f64> {
        if self.is_empty() {
            None
        } else {
            Some(self.success as f64 / self.total() as f64 * 100.0)
        }
    }
}

impl Add for StatBucket {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            success: self.success.saturating_add(rhs.success),
            failure: self.failure.saturating_add(rhs.failure),
        }
    }
}

impl AddAssign for StatBucket {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

// ============================================================================
// Usage Stat
// ============================================================================

/// One request outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageStat {
    /// Auth index of the credential that served the request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_index: Option<String>,
    /// Source label (account, API key, or prefix).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Outcome status, e.g. `success`, `ok`, `failure`.
    pub status: String,
    /// Model name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// When the request happened.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl UsageStat {
    /// Creates a stat with only a status set.
    pub fn new(status: impl Into<String>) -> Self {
        Self {
            auth_index: None,
            source: None,
            status: status.into(),
            model: None,
            timestamp: None,
        }
    }

    /// Sets the auth index.
    pub fn with_auth_index(mut self, auth_index: impl Into<String>) -> Self {
        self.auth_index = Some(auth_index.into());
        self
    }

    /// Sets the source.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Returns true for `success` or `ok` (case-insensitive).
    pub fn is_success(&self) -> bool {
        matches!(
            self.status.trim().to_lowercase().as_str(),
            "success" | "ok"
        )
    }
}

// ============================================================================
// Key Stats
// ============================================================================

/// Usage buckets aggregated by source and by auth index.
///
/// Source keys are normalized with [`KeyStats::normalize_source`]; auth
/// index keys are trimmed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyStats {
    /// Buckets by normalized source.
    pub by_source: HashMap<String, StatBucket>,
    /// Buckets by auth index.
    pub by_auth_index: HashMap<String, StatBucket>,
}

impl KeyStats {
    /// Aggregates stat entries into buckets.
    pub fn from_entries(entries: &[UsageStat]) -> Self {
        let mut stats = Self::default();
        for entry in entries {
            let success = entry.is_success();
            if let Some(source) = entry.source.as_deref().map(Self::normalize_source) {
                if !source.is_empty() {
                    stats.by_source.entry(source).or_default().record(success);
                }
            }
            if let Some(index) = entry.auth_index.as_deref().map(str::trim) {
                if !index.is_empty() {
                    stats
                        .by_auth_index
                        .entry(index.to_string())
                        .or_default()
                        .record(success);
                }
            }
        }
        stats
    }

    /// Normalizes a source or name for bucket lookup: trimmed, lower-cased.
    pub fn normalize_source(source: &str) -> String {
        source.trim().to_lowercase()
    }

    /// Looks up a source bucket.
    pub fn source(&self, key: &str) -> Option<StatBucket> {
        self.by_source.get(&Self::normalize_source(key)).copied()
    }

    /// Looks up an auth index bucket.
    pub fn auth_index(&self, key: &str) -> Option<StatBucket> {
        self.by_auth_index.get(key.trim()).copied()
    }
}

// ============================================================================
// Usage Stats
// ============================================================================

/// Usage entries and their aggregated buckets.
///
/// This is replaced wholesale on every refresh and never mutated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsageStats {
    /// Individual request outcomes.
    pub entries: Vec<UsageStat>,
    /// Pre-aggregated buckets.
    pub keys: KeyStats,
}

impl UsageStats {
    /// Builds stats from individual entries.
    pub fn from_entries(entries: Vec<UsageStat>) -> Self {
        let keys = KeyStats::from_entries(&entries);
        Self { entries, keys }
    }

    /// Builds stats from a usage payload.
    pub fn from_blob(blob: &UsageBlob) -> Self {
        Self::from_entries(blob.entries())
    }

    /// Returns true if there are no entries and no buckets.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.keys.by_source.is_empty() && self.keys.by_auth_index.is_empty()
    }
}

// ============================================================================
// Usage Blob (wire shape)
// ============================================================================

/// Raw usage payload returned by the management API.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UsageBlob {
    /// Usage summary.
    #[serde(default)]
    pub usage: UsageSummary,
}

/// Totals plus a per-API breakdown.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UsageSummary {
    /// Total requests.
    pub total_requests: u64,
    /// Successful requests.
    pub success_count: u64,
    /// Failed requests.
    pub failure_count: u64,
    /// Total tokens.
    pub total_tokens: u64,
    /// Usage by API (client key).
    pub apis: BTreeMap<String, ApiUsage>,
}

/// Usage for one API.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiUsage {
    /// Total requests.
    pub total_requests: u64,
    /// Total tokens.
    pub total_tokens: u64,
    /// Usage by model.
    pub models: BTreeMap<String, ModelUsage>,
}

/// Usage for one model.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelUsage {
    /// Total requests.
    pub total_requests: u64,
    /// Total tokens.
    pub total_tokens: u64,
    /// Individual requests.
    pub details: Vec<UsageDetail>,
}

/// One request as reported by the usage endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UsageDetail {
    /// When the request happened.
    pub timestamp: Option<DateTime<Utc>>,
    /// Source label.
    pub source: Option<String>,
    /// Auth index; the API sends either a string or a number.
    #[serde(deserialize_with = "string_or_number")]
    pub auth_index: Option<String>,
    /// Whether the request failed; `null` reads as not failed.
    #[serde(deserialize_with = "null_as_default")]
    pub failed: bool,
    /// Explicit status, when the server provides one.
    pub status: Option<String>,
    /// Token counts.
    pub tokens: TokenStats,
}

/// Token counts for one request.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenStats {
    /// Input tokens.
    pub input_tokens: u64,
    /// Output tokens.
    pub output_tokens: u64,
    /// Total tokens.
    pub total_tokens: u64,
}

impl UsageDetail {
    /// Returns the status string: the explicit one, else derived from `failed`.
    pub fn status(&self) -> String {
        match self.status.as_deref().map(str::trim) {
            Some(status) if !status.is_empty() => status.to_string(),
            _ if self.failed => "failure".to_string(),
            _ => "success".to_string(),
        }
    }
}

impl UsageBlob {
    /// Flattens every detail into a stat entry, in payload order.
    pub fn entries(&self) -> Vec<UsageStat> {
        self.usage
            .apis
            .values()
            .flat_map(|api| api.models.iter())
            .flat_map(|(model, usage)| {
                usage.details.iter().map(move |detail| UsageStat {
                    auth_index: detail.auth_index.clone(),
                    source: detail.source.clone(),
                    status: detail.status(),
                    model: Some(model.clone()),
                    timestamp: detail.timestamp,
                })
            })
            .collect()
    }

    /// Aggregates the payload into source and auth index buckets.
    pub fn key_stats(&self) -> KeyStats {
        KeyStats::from_entries(&self.entries())
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stat_success_statuses() {
        assert!(UsageStat::new("success").is_success());
        assert!(UsageStat::new(" OK ").is_success());
        assert!(!UsageStat::new("failure").is_success());
        assert!(!UsageStat::new("").is_success());
    }

    #[test]
    fn test_bucket_arithmetic() {
        let mut bucket = StatBucket::new(1, 2);
        bucket += StatBucket::new(3, 4);
        assert_eq!(bucket, StatBucket::new(4, 6));
        assert_eq!(bucket.total(), 10);
        assert_eq!(bucket.success_rate(), Some(40.0));
        assert_eq!(StatBucket::default().success_rate(), None);
    }

    #[test]
    fn test_key_stats_from_entries() {
        let entries = vec![
            UsageStat::new("success").with_source(" Alice@Example.com ").with_auth_index("1"),
            UsageStat::new("failure").with_source("alice@example.com"),
            UsageStat::new("ok").with_auth_index(" 1 "),
            UsageStat::new("success").with_source("  "),
        ];
        let stats = KeyStats::from_entries(&entries);

        assert_eq!(stats.source("ALICE@example.com"), Some(StatBucket::new(1, 1)));
        assert_eq!(stats.auth_index("1"), Some(StatBucket::new(2, 0)));
        assert_eq!(stats.by_source.len(), 1);
    }

    #[test]
    fn test_blob_entries_flatten() {
        let json = r#"{
            "usage": {
                "total_requests": 3,
                "apis": {
                    "client-key": {
                        "models": {
                            "gemini-pro": {
                                "details": [
                                    {"source": "a@x.com", "auth_index": 7, "failed": false},
                                    {"source": "a@x.com", "auth_index": "7", "failed": true}
                                ]
                            },
                            "gemini-flash": {
                                "details": [
                                    {"source": "b@x.com", "status": "ok", "failed": true}
                                ]
                            }
                        }
                    }
                }
            }
        }"#;
        let blob: UsageBlob = serde_json::from_str(json).unwrap();
        let entries = blob.entries();

        assert_eq!(entries.len(), 3);
        // BTreeMap orders models by name.
        assert_eq!(entries[0].model.as_deref(), Some("gemini-flash"));
        assert!(entries[0].is_success());
        assert_eq!(entries[1].auth_index.as_deref(), Some("7"));
        assert!(entries[1].is_success());
        assert!(!entries[2].is_success());

        let keys = blob.key_stats();
        assert_eq!(keys.auth_index("7"), Some(StatBucket::new(1, 1)));
        assert_eq!(keys.source("b@x.com"), Some(StatBucket::new(1, 0)));
    }

    #[test]
    fn test_null_failed_counts_as_success() {
        let json = r#"{"usage": {"apis": {"k": {"models": {"m": {"details": [
            {"auth_index": 1, "failed": null},
            {"auth_index": 1, "failed": true}
        ]}}}}}}"#;
        let blob: UsageBlob = serde_json::from_str(json).unwrap();
        assert_eq!(blob.key_stats().auth_index("1"), Some(StatBucket::new(1, 1)));
    }

    #[test]
    fn test_empty_blob() {
        let blob: UsageBlob = serde_json::from_str("{}").unwrap();
        assert!(UsageStats::from_blob(&blob).is_empty());
    }
}
