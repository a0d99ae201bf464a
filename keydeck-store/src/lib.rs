// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # Keydeck Store
//!
//! State management for Keydeck credential panels.
//!
//! This crate provides:
//!
//! - **CredentialPanel**: list, stats, filter, selection, and optimistic
//!   enable/disable with rollback, observable via a watch channel
//! - **Optimistic**: snapshot/rollback wrapper shared by every mutation
//! - **Catalog** / **TracingNotifier**: translator and notifier collaborators
//! - **Config**: JSON configuration with secure persistence
//!
//! ## Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use keydeck_store::{Catalog, CredentialPanel, PanelContext, TracingNotifier};
//!
//! let context = PanelContext::connected(Arc::new(TracingNotifier), Arc::new(Catalog::default()));
//! let panel = CredentialPanel::new(backend, usage, context);
//! panel.mount().await;
//!
//! let outcome = panel.set_enabled("alice.json", false).await;
//! let mut rx = panel.subscribe();
//! while rx.changed().await.is_ok() {
//!     println!("Panel updated!");
//! }
//! ```

pub mod config;
pub mod error;
pub mod i18n;
pub mod notify;
pub mod optimistic;
pub mod panel;
pub mod persistence;

pub use config::{Config, PanelConfig, ServerConfig, DEFAULT_MANAGEMENT_KEY_ENV};
pub use error::StoreError;
pub use i18n::{interpolate, Catalog, Language};
pub use notify::{MemoryNotifier, TracingNotifier};
pub use optimistic::Optimistic;
pub use panel::{
    ConnectionStatus, CredentialPanel, MutationOutcome, PanelContext, PanelOptions,
    SelectionClear, SkipReason,
};
pub use persistence::{default_config_dir, default_config_path, load_json, save_json};
