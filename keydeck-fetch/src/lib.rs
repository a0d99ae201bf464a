// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # Keydeck Fetch
//!
//! HTTP access to the proxy management API.
//!
//! - [`client::ManagementClient`] - reqwest client with bearer auth and
//!   error body decoding
//! - [`wire`] - JSON shapes of the management endpoints
//! - [`backends`] - [`keydeck_core::CredentialBackend`] and
//!   [`keydeck_core::UsageSource`] implementations
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use keydeck_fetch::{AuthFilesBackend, ManagementClient, UsageApi};
//!
//! let client = Arc::new(ManagementClient::new("localhost:8317", Some(key))?);
//! let files = AuthFilesBackend::new(client.clone());
//! let usage = UsageApi::new(client);
//! ```

pub mod backends;
pub mod client;
pub mod error;
pub mod wire;

pub use backends::{ApiKeyBackend, AuthFilesBackend, UsageApi};
pub use client::{ManagementClient, DEFAULT_TIMEOUT_SECS};
pub use error::FetchError;
pub use wire::{ApiKeyEntry, AuthFileEntry};
