//! Bar chart shaping.

use serde::{Deserialize, Serialize};

use crate::models::CredentialRecord;

/// Maximum label length for [`LabelStrategy::TruncatedName`].
pub const LABEL_MAX_CHARS: usize = 20;

/// How chart labels are derived from records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelStrategy {
    /// Display name cut to [`LABEL_MAX_CHARS`] characters.
    TruncatedName,
    /// Masked API key.
    MaskedKey,
}

/// Chart adapter configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartConfig {
    /// When set, only records with traffic are charted, at most this many.
    pub cap: Option<usize>,
    /// Label strategy.
    pub label: LabelStrategy,
}

impl ChartConfig {
    /// Auth files: the first 20 records with traffic, truncated names.
    pub fn auth_files() -> Self {
        Self {
            cap: Some(20),
            label: LabelStrategy::TruncatedName,
        }
    }

    /// API keys: every record, masked keys.
    pub fn api_keys() -> Self {
        Self {
            cap: None,
            label: LabelStrategy::MaskedKey,
        }
    }
}

/// Parallel label and series arrays.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartSeries {
    /// Bar labels.
    pub labels: Vec<String>,
    /// Success counts.
    pub success: Vec<u64>,
    /// Failure counts.
    pub failure: Vec<u64>,
}

impl ChartSeries {
    /// Number of bars.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Returns true if there are no bars.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Reshapes normalized records into chart series.
pub fn to_chart_series(records: &[CredentialRecord], config: &ChartConfig) -> ChartSeries {
    let selected: Vec<&CredentialRecord> = match config.cap {
        Some(cap) => records
            .iter()
            .filter(|r| !r.stats.is_empty())
            .take(cap)
            .collect(),
        None => records.iter().collect(),
    };

    let mut series = ChartSeries::default();
    for record in selected {
        series.labels.push(label(record, config.label));
        series.success.push(record.stats.success);
        series.failure.push(record.stats.failure);
    }
    series
}

fn label(record: &CredentialRecord, strategy: LabelStrategy) -> String {
    match strategy {
        LabelStrategy::TruncatedName => record.display_name().chars().take(LABEL_MAX_CHARS).collect(),
        LabelStrategy::MaskedKey => record.masked_key(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ApiKeyProvider, StatBucket};

    fn file(name: &str, success: u64, failure: u64) -> CredentialRecord {
        let mut record = CredentialRecord::auth_file(name);
        record.stats = StatBucket::new(success, failure);
        record
    }

    #[test]
    fn test_capped_skips_idle_and_truncates() {
        let records = vec![
            file("idle.json", 0, 0),
            file("a-very-long-credential-file-name.json", 3, 1),
            file("b.json", 0, 2),
        ];
        let series = to_chart_series(&records, &ChartConfig::auth_files());

        assert_eq!(series.labels, vec!["a-very-long-credenti", "b.json"]);
        assert_eq!(series.success, vec![3, 0]);
        assert_eq!(series.failure, vec![1, 2]);
    }

    #[test]
    fn test_cap_limits_bars() {
        let records: Vec<_> = (0..30).map(|i| file(&format!("{i}"), 1, 0)).collect();
        let series = to_chart_series(&records, &ChartConfig::auth_files());
        assert_eq!(series.len(), 20);
        assert_eq!(series.labels.last().map(String::as_str), Some("19"));
    }

    #[test]
    fn test_uncapped_masked_includes_everything() {
        let mut active = CredentialRecord::api_key(ApiKeyProvider::Gemini, 0, "AIzaSy0123456789");
        active.stats = StatBucket::new(5, 0);
        let idle = CredentialRecord::api_key(ApiKeyProvider::Gemini, 1, "short");

        let series = to_chart_series(&[active, idle], &ChartConfig::api_keys());
        assert_eq!(series.labels, vec!["AIza...6789", "sh***"]);
        assert_eq!(series.success, vec![5, 0]);
        assert_eq!(series.failure, vec![0, 0]);
    }

    #[test]
    fn test_empty_input() {
        assert!(to_chart_series(&[], &ChartConfig::auth_files()).is_empty());
    }
}
