//! JSON output formatting.

use std::collections::BTreeMap;

use anyhow::Result;
use chrono::{DateTime, Utc};
use keydeck_core::{CredentialRecord, KeyStats, RecordKind, Severity, StatBucket, UsageSummary};
use keydeck_store::MutationOutcome;
use serde::{Serialize, Serializer};

// ============================================================================
// Output Types
// ============================================================================

/// JSON output for a credential list.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListOutput {
    pub source: String,
    pub total: usize,
    pub shown: usize,
    #[serde(serialize_with = "serialize_datetime_opt", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    pub records: Vec<RecordOutput>,
}

/// One credential.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordOutput {
    pub id: String,
    pub name: String,
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub disabled: bool,
    pub success: u64,
    pub failure: u64,
}

/// Result of an enable/disable command.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutcomeOutput<'a> {
    pub enabled: bool,
    #[serde(flatten)]
    pub outcome: &'a MutationOutcome,
    pub notifications: Vec<NotificationOutput>,
}

/// A notification shown during a mutation.
#[derive(Debug, Serialize)]
pub struct NotificationOutput {
    pub severity: Severity,
    pub message: String,
}

/// Usage statistics.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsOutput {
    pub total_requests: u64,
    pub success_count: u64,
    pub failure_count: u64,
    pub total_tokens: u64,
    pub by_source: BTreeMap<String, StatBucket>,
    pub by_auth_index: BTreeMap<String, StatBucket>,
}

fn serialize_datetime_opt<S>(dt: &Option<DateTime<Utc>>, s: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match dt {
        Some(dt) => s.serialize_str(&dt.to_rfc3339()),
        None => s.serialize_none(),
    }
}

// ============================================================================
// JSON Formatter
// ============================================================================

/// JSON output formatter.
pub struct JsonFormatter {
    pretty: bool,
}

impl JsonFormatter {
    /// Creates a new JSON formatter.
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    /// Formats any serializable value.
    pub fn format<T: Serialize>(&self, data: &T) -> Result<String> {
        if self.pretty {
            Ok(serde_json::to_string_pretty(data)?)
        } else {
            Ok(serde_json::to_string(data)?)
        }
    }

    /// Formats a credential list.
    pub fn format_records(
        &self,
        source: &str,
        total: usize,
        updated_at: Option<DateTime<Utc>>,
        records: &[CredentialRecord],
    ) -> Result<String> {
        let output = ListOutput {
            source: source.to_string(),
            total,
            shown: records.len(),
            updated_at,
            records: records.iter().map(record_to_output).collect(),
        };
        self.format(&output)
    }

    /// Formats a mutation outcome and its notifications.
    pub fn format_outcome(
        &self,
        enabled: bool,
        outcome: &MutationOutcome,
        notifications: &[(String, Severity)],
    ) -> Result<String> {
        let output = OutcomeOutput {
            enabled,
            outcome,
            notifications: notifications
                .iter()
                .map(|(message, severity)| NotificationOutput {
                    severity: *severity,
                    message: message.clone(),
                })
                .collect(),
        };
        self.format(&output)
    }

    /// Formats usage totals and buckets.
    pub fn format_stats(&self, summary: &UsageSummary, keys: &KeyStats) -> Result<String> {
        let output = StatsOutput {
            total_requests: summary.total_requests,
            success_count: summary.success_count,
            failure_count: summary.failure_count,
            total_tokens: summary.total_tokens,
            by_source: keys.by_source.clone().into_iter().collect(),
            by_auth_index: keys.by_auth_index.clone().into_iter().collect(),
        };
        self.format(&output)
    }
}

fn record_to_output(record: &CredentialRecord) -> RecordOutput {
    let (kind, provider) = match record.kind {
        RecordKind::AuthFile => ("auth_file", record.provider().map(ToOwned::to_owned)),
        RecordKind::ApiKey { provider } => ("api_key", Some(provider.cli_name().to_string())),
    };
    RecordOutput {
        id: record.id.clone(),
        name: record.display_name(),
        kind,
        provider,
        prefix: record.prefix().map(ToOwned::to_owned),
        api_key: record.is_api_key().then(|| record.masked_key()),
        disabled: record.disabled,
        success: record.stats.success,
        failure: record.stats.failure,
    }
}
