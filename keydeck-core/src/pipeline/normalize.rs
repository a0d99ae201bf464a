//! Stats join and record normalization.

use std::collections::HashMap;
use std::hash::Hash;

use serde::{Deserialize, Serialize};

use crate::models::{CredentialRecord, KeyStats, StatBucket, UsageStat, UsageStats};

// ============================================================================
// Join
// ============================================================================

/// Joins `secondary` onto `primary` by key.
///
/// `merge` runs once for every secondary item whose key equals the primary
/// item's key, in secondary order. Keys are not required to be unique, so a
/// primary item may absorb many secondary items. Primary items without a key
/// or without a match pass through untouched; output order and length equal
/// the input's.
pub fn join<P, S, K>(
    primary: Vec<P>,
    secondary: &[S],
    primary_key: impl Fn(&P) -> Option<K>,
    secondary_key: impl Fn(&S) -> Option<K>,
    mut merge: impl FnMut(&mut P, &S),
) -> Vec<P>
where
    K: Eq + Hash,
{
    let mut index: HashMap<K, Vec<&S>> = HashMap::new();
    for item in secondary {
        if let Some(key) = secondary_key(item) {
            index.entry(key).or_default().push(item);
        }
    }

    primary
        .into_iter()
        .map(|mut item| {
            if let Some(matches) = primary_key(&item).and_then(|key| index.get(&key)) {
                for matched in matches {
                    merge(&mut item, matched);
                }
            }
            item
        })
        .collect()
}

// ============================================================================
// Options
// ============================================================================

/// Which usage entry field is compared with a record's `join_key`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryJoin {
    /// Match on the entry's auth index.
    AuthIndex,
    /// Match on the entry's source.
    Source,
}

impl EntryJoin {
    fn key_of(self, stat: &UsageStat) -> Option<&str> {
        match self {
            Self::AuthIndex => stat.auth_index.as_deref(),
            Self::Source => stat.source.as_deref(),
        }
    }
}

/// Which pre-aggregated bucket map is looked up with a record's `bucket_key`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BucketJoin {
    /// Look up [`KeyStats::by_source`] with the normalized key.
    BySource,
    /// Look up [`KeyStats::by_auth_index`] with the trimmed key.
    ByAuthIndex,
}

impl BucketJoin {
    fn lookup(self, keys: &KeyStats, key: &str) -> Option<StatBucket> {
        match self {
            Self::BySource => keys.source(key),
            Self::ByAuthIndex => keys.auth_index(key),
        }
    }
}

/// How usage stats are joined onto records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizeOptions {
    /// Per-entry join, if any.
    pub entry_join: Option<EntryJoin>,
    /// Bucket join, if any.
    pub bucket_join: Option<BucketJoin>,
}

impl NormalizeOptions {
    /// Auth files: entries by auth index, plus the source bucket for the name.
    pub fn auth_files() -> Self {
        Self {
            entry_join: Some(EntryJoin::AuthIndex),
            bucket_join: Some(BucketJoin::BySource),
        }
    }

    /// API-key configs: entries by source, plus the source bucket for the prefix.
    pub fn api_keys() -> Self {
        Self {
            entry_join: Some(EntryJoin::Source),
            bucket_join: Some(BucketJoin::BySource),
        }
    }
}

// ============================================================================
// Normalize
// ============================================================================

/// Derives `disabled` and `stats` for every record.
///
/// The per-entry and bucket contributions are summed; a request counted by
/// both joins is counted twice. Stats already on the input records are
/// discarded, so normalizing a normalized list gives the same result.
pub fn normalize(
    records: Vec<CredentialRecord>,
    stats: &UsageStats,
    options: &NormalizeOptions,
) -> Vec<CredentialRecord> {
    let records: Vec<CredentialRecord> = records
        .into_iter()
        .map(|mut record| {
            record.disabled = record.stored_disabled();
            record.stats = StatBucket::default();
            record
        })
        .collect();

    let records = match options.entry_join {
        Some(entry_join) => join(
            records,
            &stats.entries,
            |record| trimmed(record.join_key.as_deref()),
            |stat| trimmed(entry_join.key_of(stat)),
            |record, stat| record.stats.record(stat.is_success()),
        ),
        None => records,
    };

    match options.bucket_join {
        Some(bucket_join) => records
            .into_iter()
            .map(|mut record| {
                if let Some(bucket) = record
                    .bucket_key
                    .as_deref()
                    .and_then(|key| bucket_join.lookup(&stats.keys, key))
                {
                    record.stats += bucket;
                }
                record
            })
            .collect(),
        None => records,
    }
}

fn trimmed(key: Option<&str>) -> Option<String> {
    key.map(str::trim)
        .filter(|k| !k.is_empty())
        .map(ToOwned::to_owned)
}
