//! Credential record types.
//!
//! This module contains the records shown in the credential lists:
//! - [`ApiKeyProvider`] - Providers that carry API-key configs
//! - [`RecordKind`] - Auth file or API-key config
//! - [`CredentialRecord`] - A record with derived disabled flag and stats

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::usage::StatBucket;

/// Excluded-models entry meaning "every model is excluded".
///
/// API-key configs have no stored disabled flag; a config carrying this
/// entry is treated as disabled.
pub const DISABLE_ALL_MODELS: &str = "*";

/// Well-known metadata keys.
pub mod meta {
    /// Provider type of an auth file (e.g. `gemini`, `claude`).
    pub const PROVIDER: &str = "provider";
    /// Routing prefix.
    pub const PREFIX: &str = "prefix";
    /// Upstream base URL.
    pub const BASE_URL: &str = "base_url";
    /// Outbound proxy URL.
    pub const PROXY_URL: &str = "proxy_url";
    /// API key value.
    pub const API_KEY: &str = "api_key";
    /// File size in bytes.
    pub const SIZE: &str = "size";
    /// Last modified timestamp.
    pub const MODIFIED: &str = "modified";
    /// Account email or label.
    pub const ACCOUNT: &str = "account";
}

// ============================================================================
// API Key Provider
// ============================================================================

/// Providers whose credentials are API-key config lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiKeyProvider {
    /// Google Gemini
    Gemini,
    /// Anthropic Claude
    Claude,
    /// OpenAI Codex
    Codex,
    /// Google Cloud Vertex AI
    Vertex,
}

impl ApiKeyProvider {
    /// Returns the display name for this provider.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Gemini => "Gemini",
            Self::Claude => "Claude",
            Self::Codex => "Codex",
            Self::Vertex => "Vertex AI",
        }
    }

    /// Returns all API-key providers.
    pub fn all() -> &'static [ApiKeyProvider] {
        &[Self::Gemini, Self::Claude, Self::Codex, Self::Vertex]
    }

    /// Returns the CLI name for this provider.
    pub fn cli_name(&self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::Claude => "claude",
            Self::Codex => "codex",
            Self::Vertex => "vertex",
        }
    }

    /// Looks up a provider by CLI name (case-insensitive).
    pub fn from_cli_name(name: &str) -> Option<Self> {
        let name = name.trim().to_lowercase();
        Self::all().iter().copied().find(|p| p.cli_name() == name)
    }

    /// Returns the config key used by the management API, e.g. `gemini-api-key`.
    pub fn config_key(&self) -> String {
        format!("{}-api-key", self.cli_name())
    }
}

// ============================================================================
// Record Kind
// ============================================================================

/// Which list a record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RecordKind {
    /// An uploaded auth file, identified by file name.
    AuthFile,
    /// An entry in a provider's API-key config list, identified by index.
    ApiKey {
        /// Owning provider.
        provider: ApiKeyProvider,
    },
}

// ============================================================================
// Credential Record
// ============================================================================

/// A credential as shown in the list.
///
/// `disabled` and `stats` are derived by [`crate::normalize`]; backends
/// fill in the stored fields and leave the derived ones at their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialRecord {
    /// Stable id: file name for auth files, list index for API keys.
    pub id: String,
    /// Record kind.
    pub kind: RecordKind,
    /// Whether the record is disabled.
    #[serde(default)]
    pub disabled: bool,
    /// Excluded model names (API-key configs only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub excluded_models: Vec<String>,
    /// Key matched against individual usage entries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub join_key: Option<String>,
    /// Key looked up in the pre-aggregated usage buckets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bucket_key: Option<String>,
    /// Provider metadata; see [`meta`] for well-known keys.
    #[serde(default)]
    pub metadata: BTreeMap<String, Option<String>>,
    /// Success/failure counters.
    #[serde(default)]
    pub stats: StatBucket,
}

impl CredentialRecord {
    /// Creates an auth-file record.
    pub fn auth_file(name: impl Into<String>) -> Self {
        Self::new(name, RecordKind::AuthFile)
    }

    /// Creates an API-key config record at `index`.
    pub fn api_key(provider: ApiKeyProvider, index: usize, key: impl Into<String>) -> Self {
        Self::new(index.to_string(), RecordKind::ApiKey { provider })
            .with_meta(meta::API_KEY, Some(key.into()))
    }

    fn new(id: impl Into<String>, kind: RecordKind) -> Self {
        Self {
            id: id.into(),
            kind,
            disabled: false,
            excluded_models: Vec::new(),
            join_key: None,
            bucket_key: None,
            metadata: BTreeMap::new(),
            stats: StatBucket::default(),
        }
    }

    /// Sets the stored disabled flag.
    pub fn with_disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    /// Sets the excluded models.
    pub fn with_excluded_models(mut self, models: Vec<String>) -> Self {
        self.excluded_models = models;
        self
    }

    /// Sets the per-entry join key.
    pub fn with_join_key(mut self, key: impl Into<String>) -> Self {
        self.join_key = Some(key.into());
        self
    }

    /// Sets the bucket join key.
    pub fn with_bucket_key(mut self, key: impl Into<String>) -> Self {
        self.bucket_key = Some(key.into());
        self
    }

    /// Sets a metadata value.
    pub fn with_meta(mut self, key: &str, value: Option<String>) -> Self {
        self.metadata.insert(key.to_string(), value);
        self
    }

    /// Returns a metadata value, if present and set.
    pub fn meta(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(|v| v.as_deref())
    }

    /// Returns the provider type label.
    pub fn provider(&self) -> Option<&str> {
        match self.kind {
            RecordKind::AuthFile => self.meta(meta::PROVIDER),
            RecordKind::ApiKey { provider } => Some(provider.cli_name()),
        }
    }

    /// Returns the routing prefix.
    pub fn prefix(&self) -> Option<&str> {
        self.meta(meta::PREFIX)
    }

    /// Returns the API key (API-key configs only).
    pub fn api_key_value(&self) -> Option<&str> {
        self.meta(meta::API_KEY)
    }

    /// Returns true for API-key config records.
    pub fn is_api_key(&self) -> bool {
        matches!(self.kind, RecordKind::ApiKey { .. })
    }

    /// Returns true if the excluded models contain [`DISABLE_ALL_MODELS`].
    pub fn has_disable_all_marker(&self) -> bool {
        self.excluded_models
            .iter()
            .any(|m| m.trim() == DISABLE_ALL_MODELS)
    }

    /// Returns the disabled flag as stored by the backend.
    ///
    /// Auth files carry an explicit flag; API-key configs are disabled by the
    /// [`DISABLE_ALL_MODELS`] marker.
    pub fn stored_disabled(&self) -> bool {
        match self.kind {
            RecordKind::AuthFile => self.disabled,
            RecordKind::ApiKey { .. } => self.has_disable_all_marker(),
        }
    }

    /// Enables or disables the record locally.
    ///
    /// For API-key configs this adds or removes the [`DISABLE_ALL_MODELS`]
    /// marker so the change survives a whole-list save.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.disabled = !enabled;
        if self.is_api_key() {
            if enabled {
                self.excluded_models
                    .retain(|m| m.trim() != DISABLE_ALL_MODELS);
            } else if !self.has_disable_all_marker() {
                self.excluded_models.push(DISABLE_ALL_MODELS.to_string());
            }
        }
    }

    /// Fields matched by the text search.
    pub fn search_fields(&self) -> Vec<&str> {
        match self.kind {
            RecordKind::AuthFile => [Some(self.id.as_str()), self.provider()]
                .into_iter()
                .flatten()
                .collect(),
            RecordKind::ApiKey { .. } => [
                self.api_key_value(),
                self.meta(meta::BASE_URL),
                self.prefix(),
            ]
            .into_iter()
            .flatten()
            .collect(),
        }
    }

    /// Human-readable name: file name, or prefix / masked key for API keys.
    pub fn display_name(&self) -> String {
        match self.kind {
            RecordKind::AuthFile => self.id.clone(),
            RecordKind::ApiKey { .. } => match self.prefix().map(str::trim) {
                Some(prefix) if !prefix.is_empty() => prefix.to_string(),
                _ => self.masked_key(),
            },
        }
    }

    /// Masked API key, falling back to the masked id.
    pub fn masked_key(&self) -> String {
        mask_api_key(self.api_key_value().unwrap_or(&self.id))
    }
}

/// Masks an API key for display.
///
/// Keys longer than 8 characters keep their first and last four characters;
/// shorter keys keep only the first two.
pub fn mask_api_key(key: &str) -> String {
    let key = key.trim();
    let chars: Vec<char> = key.chars().collect();
    if chars.is_empty() {
        return String::new();
    }
    if chars.len() <= 8 {
        let head: String = chars.iter().take(2).collect();
        return format!("{head}***");
    }
    let head: String = chars.iter().take(4).collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_api_key() {
        assert_eq!(mask_api_key(""), "");
        assert_eq!(mask_api_key("abc"), "ab***");
        assert_eq!(mask_api_key("abcdefgh"), "ab***");
        assert_eq!(mask_api_key("sk-1234567890abcd"), "sk-1...abcd");
    }

    #[test]
    fn test_api_key_disabled_by_marker() {
        let record = CredentialRecord::api_key(ApiKeyProvider::Gemini, 0, "k")
            .with_excluded_models(vec!["gemini-pro".into(), " * ".into()]);
        assert!(record.stored_disabled());

        let record = CredentialRecord::api_key(ApiKeyProvider::Gemini, 0, "k")
            .with_disabled(true);
        // The flag alone does not disable an API-key config.
        assert!(!record.stored_disabled());
    }

    #[test]
    fn test_set_enabled_toggles_marker() {
        let mut record = CredentialRecord::api_key(ApiKeyProvider::Claude, 1, "k")
            .with_excluded_models(vec!["claude-2".into()]);

        record.set_enabled(false);
        assert!(record.disabled);
        assert_eq!(record.excluded_models, vec!["claude-2", "*"]);

        // Disabling twice does not duplicate the marker.
        record.set_enabled(false);
        assert_eq!(record.excluded_models.len(), 2);

        record.set_enabled(true);
        assert!(!record.disabled);
        assert_eq!(record.excluded_models, vec!["claude-2"]);
    }

    #[test]
    fn test_set_enabled_auth_file() {
        let mut record = CredentialRecord::auth_file("a.json");
        record.set_enabled(false);
        assert!(record.stored_disabled());
        assert!(record.excluded_models.is_empty());
    }

    #[test]
    fn test_search_fields() {
        let file = CredentialRecord::auth_file("alice.json")
            .with_meta(meta::PROVIDER, Some("gemini".into()));
        assert_eq!(file.search_fields(), vec!["alice.json", "gemini"]);

        let key = CredentialRecord::api_key(ApiKeyProvider::Codex, 0, "sk-x")
            .with_meta(meta::BASE_URL, Some("https://api.example.com".into()))
            .with_meta(meta::PREFIX, None);
        assert_eq!(key.search_fields(), vec!["sk-x", "https://api.example.com"]);
    }

    #[test]
    fn test_display_name() {
        let key = CredentialRecord::api_key(ApiKeyProvider::Codex, 0, "sk-1234567890abcd");
        assert_eq!(key.display_name(), "sk-1...abcd");

        let key = key.with_meta(meta::PREFIX, Some("team-a".into()));
        assert_eq!(key.display_name(), "team-a");
    }

    #[test]
    fn test_provider_cli_names() {
        assert_eq!(ApiKeyProvider::from_cli_name(" Gemini "), Some(ApiKeyProvider::Gemini));
        assert_eq!(ApiKeyProvider::from_cli_name("unknown"), None);
        assert_eq!(ApiKeyProvider::Vertex.config_key(), "vertex-api-key");
    }
}
