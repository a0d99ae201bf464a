//! Collaborator implementations backed by the management API.
//!
//! - [`AuthFilesBackend`] - auth files, persisted one record at a time
//! - [`ApiKeyBackend`] - provider API-key configs, persisted as a whole list
//! - [`UsageApi`] - usage statistics

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info};

use keydeck_core::{
    ApiKeyProvider, CoreError, CredentialBackend, CredentialRecord, PersistMode, UsageBlob,
    UsageSource,
};

use crate::client::ManagementClient;
use crate::wire::{
    parse_api_key_list, ApiKeyEntry, AuthFileEntry, AuthFilesResponse, AuthFileStatusRequest,
};

// ============================================================================
// Auth Files
// ============================================================================

/// Auth files list (`/auth-files`).
#[derive(Debug, Clone)]
pub struct AuthFilesBackend {
    client: Arc<ManagementClient>,
}

impl AuthFilesBackend {
    /// Creates the backend.
    pub fn new(client: Arc<ManagementClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CredentialBackend for AuthFilesBackend {
    fn name(&self) -> &str {
        "auth-files"
    }

    fn persist_mode(&self) -> PersistMode {
        PersistMode::PerItem
    }

    async fn list(&self) -> Result<Vec<CredentialRecord>, CoreError> {
        let response: AuthFilesResponse = self.client.get_json("auth-files").await?;
        debug!(count = response.files.len(), "Fetched auth files");
        Ok(response
            .files
            .into_iter()
            .map(AuthFileEntry::into_record)
            .collect())
    }

    async fn set_status(&self, id: &str, disabled: bool) -> Result<(), CoreError> {
        let body = AuthFileStatusRequest { name: id, disabled };
        self.client.patch_json("auth-files/status", &body).await?;
        info!(name = %id, disabled, "Auth file status updated");
        Ok(())
    }
}

// ============================================================================
// API Keys
// ============================================================================

/// A provider's API-key config list (`/<provider>-api-key`).
///
/// The last listed entries are cached so a save can write back fields this
/// client does not model.
#[derive(Debug)]
pub struct ApiKeyBackend {
    client: Arc<ManagementClient>,
    provider: ApiKeyProvider,
    name: String,
    entries: RwLock<Vec<ApiKeyEntry>>,
}

impl ApiKeyBackend {
    /// Creates the backend for `provider`.
    pub fn new(client: Arc<ManagementClient>, provider: ApiKeyProvider) -> Self {
        Self {
            client,
            provider,
            name: provider.config_key(),
            entries: RwLock::new(Vec::new()),
        }
    }

    /// Returns the provider.
    pub fn provider(&self) -> ApiKeyProvider {
        self.provider
    }
}

#[async_trait]
impl CredentialBackend for ApiKeyBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn persist_mode(&self) -> PersistMode {
        PersistMode::WholeList
    }

    async fn list(&self) -> Result<Vec<CredentialRecord>, CoreError> {
        let value: Value = self.client.get_json(&self.name).await?;
        let entries = parse_api_key_list(self.provider, value)?;
        debug!(provider = ?self.provider, count = entries.len(), "Fetched API keys");

        let records = entries
            .iter()
            .enumerate()
            .map(|(index, entry)| entry.to_record(self.provider, index))
            .collect();
        *self.entries.write().await = entries;
        Ok(records)
    }

    async fn save(&self, records: &[CredentialRecord]) -> Result<(), CoreError> {
        let cached = self.entries.read().await.clone();
        let entries: Vec<ApiKeyEntry> = records
            .iter()
            .map(|record| {
                let mut entry = record
                    .id
                    .parse::<usize>()
                    .ok()
                    .and_then(|index| cached.get(index).cloned())
                    .unwrap_or_default();
                entry.apply_record(record);
                entry
            })
            .collect();

        self.client.put_json(&self.name, &entries).await?;
        info!(provider = ?self.provider, count = entries.len(), "API key list saved");
        *self.entries.write().await = entries;
        Ok(())
    }
}

// ============================================================================
// Usage
// ============================================================================

/// Usage statistics (`/usage`).
#[derive(Debug, Clone)]
pub struct UsageApi {
    client: Arc<ManagementClient>,
}

impl UsageApi {
    /// Creates the usage source.
    pub fn new(client: Arc<ManagementClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl UsageSource for UsageApi {
    async fn usage(&self) -> Result<UsageBlob, CoreError> {
        let blob: UsageBlob = self.client.get_json("usage").await?;
        debug!(
            total_requests = blob.usage.total_requests,
            apis = blob.usage.apis.len(),
            "Fetched usage"
        );
        Ok(blob)
    }
}
