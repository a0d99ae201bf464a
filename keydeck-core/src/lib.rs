// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # Keydeck Core
//!
//! Core types, the credential list pipeline, and collaborator traits for
//! Keydeck.
//!
//! This crate has no I/O of its own. It provides:
//!
//! - Domain models (credential records, usage stats, stat buckets)
//! - The pure list pipeline (normalize, filter, selection, chart shaping)
//! - Trait definitions for the backend, usage, notification and i18n
//!   collaborators
//! - Error types
//!
//! ## Key Types
//!
//! ### Records
//! - [`CredentialRecord`] - A credential with derived disabled flag and stats
//! - [`RecordKind`] - Auth file or provider API-key config
//! - [`ApiKeyProvider`] - Providers that carry API-key configs
//!
//! ### Usage
//! - [`UsageBlob`] - Raw usage payload from the management API
//! - [`UsageStat`] - One request outcome
//! - [`KeyStats`] - Pre-aggregated buckets by source and auth index
//! - [`UsageStats`] - Entries plus buckets, as loaded by the panel
//!
//! ### Pipeline
//! - [`normalize`] / [`join`] - Stats join
//! - [`filter`] / [`FilterState`] - Search, status and prefix filtering
//! - [`SelectionSet`] - Selected ids
//! - [`to_chart_series`] / [`ChartConfig`] - Bar chart shaping

pub mod error;
pub mod models;
pub mod pipeline;
pub mod traits;

// Re-export error types
pub use error::CoreError;

// Re-export all model types
pub use models::{
    // Records
    mask_api_key,
    meta,
    ApiKeyProvider,
    CredentialRecord,
    RecordKind,
    DISABLE_ALL_MODELS,
    // Usage
    ApiUsage,
    KeyStats,
    ModelUsage,
    StatBucket,
    TokenStats,
    UsageBlob,
    UsageDetail,
    UsageStat,
    UsageStats,
    UsageSummary,
};

// Re-export pipeline
pub use pipeline::{
    filter, join, normalize, to_chart_series, BucketJoin, ChartConfig, ChartSeries, EntryJoin,
    FilterState, LabelStrategy, NormalizeOptions, SelectionSet, StatusFilter,
};

// Re-export traits
pub use traits::{CredentialBackend, Notifier, PersistMode, Severity, Translator, UsageSource};
