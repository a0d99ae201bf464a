//! Domain models for Keydeck.
//!
//! ## Submodules
//!
//! - [`credential`] - Credential records (auth files, API-key configs)
//! - [`usage`] - Usage payloads, stat entries, and aggregated buckets

mod credential;
mod usage;

// Re-export everything at the models level
pub use credential::{
    mask_api_key, meta, ApiKeyProvider, CredentialRecord, RecordKind, DISABLE_ALL_MODELS,
};
pub use usage::{
    ApiUsage, KeyStats, ModelUsage, StatBucket, TokenStats, UsageBlob, UsageDetail, UsageStat,
    UsageStats, UsageSummary,
};
