//! Localized notification strings.

use std::fmt;
use std::str::FromStr;

use keydeck_core::Translator;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Catalog keys used by the credential panel.
pub mod keys {
    /// `{{message}}`
    pub const LOAD_FAILED: &str = "credentials.load_failed";
    /// `{{name}}`
    pub const ENABLED: &str = "credentials.enabled";
    /// `{{name}}`
    pub const DISABLED: &str = "credentials.disabled";
    /// `{{name}}`, `{{message}}`
    pub const TOGGLE_FAILED: &str = "credentials.toggle_failed";
    /// `{{count}}`
    pub const BATCH_ENABLED: &str = "credentials.batch_enabled";
    /// `{{count}}`
    pub const BATCH_DISABLED: &str = "credentials.batch_disabled";
    /// `{{success}}`, `{{failed}}`
    pub const BATCH_PARTIAL: &str = "credentials.batch_partial";
    /// `{{count}}`, `{{message}}`
    pub const BATCH_FAILED: &str = "credentials.batch_failed";
}

/// Supported UI languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// English.
    #[default]
    En,
    /// Simplified Chinese.
    Zh,
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Language::En => write!(f, "en"),
            Language::Zh => write!(f, "zh"),
        }
    }
}

impl FromStr for Language {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "en" | "en-us" | "english" => Ok(Language::En),
            "zh" | "zh-cn" | "chinese" => Ok(Language::Zh),
            other => Err(StoreError::Config(format!("unsupported language: {other}"))),
        }
    }
}

/// Built-in string catalog.
///
/// Keys missing from the selected language fall back to English, then to
/// the key itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct Catalog {
    language: Language,
}

impl Catalog {
    /// Creates a catalog for `language`.
    pub fn new(language: Language) -> Self {
        Self { language }
    }

    /// Returns the selected language.
    pub fn language(&self) -> Language {
        self.language
    }
}

impl Translator for Catalog {
    fn text(&self, key: &str, args: &[(&str, String)]) -> String {
        let template = lookup(self.language, key)
            .or_else(|| lookup(Language::En, key))
            .unwrap_or(key);
        interpolate(template, args)
    }
}

fn lookup(language: Language, key: &str) -> Option<&'static str> {
    let text = match (language, key) {
        (Language::En, keys::LOAD_FAILED) => "Failed to load credentials: {{message}}",
        (Language::En, keys::ENABLED) => "{{name}} enabled",
        (Language::En, keys::DISABLED) => "{{name}} disabled",
        (Language::En, keys::TOGGLE_FAILED) => "Failed to update {{name}}: {{message}}",
        (Language::En, keys::BATCH_ENABLED) => "Enabled {{count}} credentials",
        (Language::En, keys::BATCH_DISABLED) => "Disabled {{count}} credentials",
        (Language::En, keys::BATCH_PARTIAL) => "{{success}} updated, {{failed}} failed",
        (Language::En, keys::BATCH_FAILED) => "Failed to update {{count}} credentials: {{message}}",

        (Language::Zh, keys::LOAD_FAILED) => "加载凭证失败：{{message}}",
        (Language::Zh, keys::ENABLED) => "已启用 {{name}}",
        (Language::Zh, keys::DISABLED) => "已禁用 {{name}}",
        (Language::Zh, keys::TOGGLE_FAILED) => "更新 {{name}} 失败：{{message}}",
        (Language::Zh, keys::BATCH_ENABLED) => "已启用 {{count}} 个凭证",
        (Language::Zh, keys::BATCH_DISABLED) => "已禁用 {{count}} 个凭证",
        (Language::Zh, keys::BATCH_PARTIAL) => "成功 {{success}} 个，失败 {{failed}} 个",
        (Language::Zh, keys::BATCH_FAILED) => "更新 {{count}} 个凭证失败：{{message}}",
        _ => return None,
    };
    Some(text)
}

/// Replaces `{{name}}` placeholders; unknown placeholders are left as is.
///
/// The template is scanned once, so placeholder text inside a substituted
/// value is never expanded.
pub fn interpolate(template: &str, args: &[(&str, String)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            out.push_str(&rest[start..]);
            return out;
        };
        let name = &after[..end];
        match args.iter().find(|(key, _)| *key == name) {
            Some((_, value)) => out.push_str(value),
            None => {
                out.push_str("{{");
                out.push_str(name);
                out.push_str("}}");
            }
        }
        rest = &after[end + 2..];
    }
    out.push_str(rest);
    out
}
