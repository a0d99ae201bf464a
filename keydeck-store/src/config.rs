//! Configuration management.

use std::path::{Path, PathBuf};

use keydeck_core::{ChartConfig, PersistMode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::StoreError;
use crate::i18n::Language;
use crate::panel::{PanelOptions, SelectionClear};
use crate::persistence::{default_config_path, load_json, save_json};

/// Environment variable read for the management key unless configured otherwise.
pub const DEFAULT_MANAGEMENT_KEY_ENV: &str = "KEYDECK_MANAGEMENT_KEY";

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Management server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Panel behavior.
    #[serde(default)]
    pub panel: PanelConfig,
}

/// Management server settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server base URL.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Environment variable holding the management key.
    #[serde(default = "default_management_key_env")]
    pub management_key_env: String,
    /// Inline management key, used when the environment variable is unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub management_key: Option<String>,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Panel behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelConfig {
    /// Source shown when none is given (`auth-files` or a provider name).
    #[serde(default = "default_source")]
    pub default_source: String,
    /// Overrides the chart cap for every source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chart_cap: Option<usize>,
    /// Overrides the selection clearing policy of per-item sources.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub per_item_clear: Option<SelectionClear>,
    /// Overrides the selection clearing policy of whole-list sources.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub whole_list_clear: Option<SelectionClear>,
    /// Notification language.
    #[serde(default)]
    pub language: Language,
}

fn default_base_url() -> String {
    "http://localhost:8317".to_string()
}

fn default_management_key_env() -> String {
    DEFAULT_MANAGEMENT_KEY_ENV.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_source() -> String {
    "auth-files".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            management_key_env: default_management_key_env(),
            management_key: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            default_source: default_source(),
            chart_cap: None,
            per_item_clear: None,
            whole_list_clear: None,
            language: Language::default(),
        }
    }
}

impl ServerConfig {
    /// Resolves the management key: environment first, then the inline key.
    pub fn resolve_management_key(&self) -> Option<String> {
        std::env::var(&self.management_key_env)
            .ok()
            .or_else(|| self.management_key.clone())
            .filter(|key| !key.trim().is_empty())
    }
}

impl PanelConfig {
    /// Panel options for `mode` with overrides applied.
    pub fn options_for(&self, mode: PersistMode) -> PanelOptions {
        let mut options = PanelOptions::for_mode(mode);
        if let Some(cap) = self.chart_cap {
            options.chart = ChartConfig {
                cap: Some(cap),
                ..options.chart
            };
        }
        let clear = match mode {
            PersistMode::PerItem => self.per_item_clear,
            PersistMode::WholeList => self.whole_list_clear,
        };
        match clear {
            Some(policy) => options.with_selection_clear(policy),
            None => options,
        }
    }
}

impl Config {
    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        default_config_path()
    }

    /// Loads configuration from the default path.
    pub async fn load() -> Result<Self, StoreError> {
        Self::load_from(&Self::default_path()).await
    }

    /// Loads configuration from a specific path. A missing file yields defaults.
    pub async fn load_from(path: &Path) -> Result<Self, StoreError> {
        if !path.exists() {
            debug!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }

        let config: Config = load_json(path).await?;
        config.validate()?;
        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Saves configuration to the default path.
    pub async fn save(&self) -> Result<(), StoreError> {
        self.save_to(&Self::default_path()).await
    }

    /// Saves configuration to a specific path.
    pub async fn save_to(&self, path: &Path) -> Result<(), StoreError> {
        self.validate()?;
        save_json(path, self).await?;
        info!(path = %path.display(), "Saved configuration");
        Ok(())
    }

    /// Checks values that would make every request fail.
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.server.base_url.trim().is_empty() {
            return Err(StoreError::Config("server.base_url is empty".to_string()));
        }
        if self.server.timeout_secs == 0 {
            return Err(StoreError::Config(
                "server.timeout_secs must be positive".to_string(),
            ));
        }
        if self.panel.chart_cap == Some(0) {
            return Err(StoreError::Config(
                "panel.chart_cap must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keydeck_core::LabelStrategy;

    #[test]
    fn test_defaults_from_empty_object() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.server.base_url, "http://localhost:8317");
        assert_eq!(config.server.timeout_secs, 30);
        assert_eq!(config.panel.default_source, "auth-files");
    }

    #[test]
    fn test_options_use_mode_defaults() {
        let panel = PanelConfig::default();

        let per_item = panel.options_for(PersistMode::PerItem);
        assert_eq!(per_item.selection_clear, SelectionClear::Always);
        assert_eq!(per_item.chart.cap, Some(20));

        let whole = panel.options_for(PersistMode::WholeList);
        assert_eq!(whole.selection_clear, SelectionClear::OnSuccess);
        assert_eq!(whole.chart.cap, None);
        assert_eq!(whole.chart.label, LabelStrategy::MaskedKey);
    }

    #[test]
    fn test_options_overrides() {
        let panel = PanelConfig {
            chart_cap: Some(5),
            whole_list_clear: Some(SelectionClear::Always),
            ..Default::default()
        };
        let whole = panel.options_for(PersistMode::WholeList);
        assert_eq!(whole.selection_clear, SelectionClear::Always);
        assert_eq!(whole.chart.cap, Some(5));
        assert_eq!(whole.chart.label, LabelStrategy::MaskedKey);
    }

    #[test]
    fn test_inline_key_when_env_unset() {
        let server = ServerConfig {
            management_key_env: "KEYDECK_TEST_UNSET_VARIABLE".to_string(),
            management_key: Some("inline".to_string()),
            ..Default::default()
        };
        assert_eq!(server.resolve_management_key().as_deref(), Some("inline"));

        let blank = ServerConfig {
            management_key: Some("  ".to_string()),
            ..server
        };
        assert_eq!(blank.resolve_management_key(), None);
    }

    #[test]
    fn test_validate() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.server.timeout_secs = 0;
        assert!(matches!(config.validate(), Err(StoreError::Config(_))));
    }
}
