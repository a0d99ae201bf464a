//! Wire types for the management API.
//!
//! These mirror the JSON the server sends and are converted into
//! [`CredentialRecord`]s at the edge. Unknown fields of API-key entries are
//! kept so a whole-list save does not drop them.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use keydeck_core::{ApiKeyProvider, CredentialRecord, meta};

// ============================================================================
// Auth Files
// ============================================================================

/// Response of `GET /auth-files`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthFilesResponse {
    /// Uploaded auth files.
    #[serde(default)]
    pub files: Vec<AuthFileEntry>,
}

/// One auth file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AuthFileEntry {
    /// File name (unique).
    pub name: String,
    /// Provider type.
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// Provider name, sent by newer servers instead of `type`.
    pub provider: Option<String>,
    /// Stored disabled flag; `null` reads as enabled.
    #[serde(deserialize_with = "null_as_default")]
    pub disabled: bool,
    /// Auth index used in usage details.
    #[serde(deserialize_with = "string_or_number")]
    pub auth_index: Option<String>,
    /// Account email.
    pub email: Option<String>,
    /// Routing prefix.
    pub prefix: Option<String>,
    /// Outbound proxy URL.
    pub proxy_url: Option<String>,
    /// File size in bytes.
    pub size: Option<u64>,
    /// Last modified timestamp.
    pub modtime: Option<String>,
}

impl AuthFileEntry {
    /// Converts into a record. `disabled` is the stored flag.
    pub fn into_record(self) -> CredentialRecord {
        let provider = self.provider.or(self.kind);
        let mut record = CredentialRecord::auth_file(self.name.clone())
            .with_disabled(self.disabled)
            .with_bucket_key(self.name)
            .with_meta(meta::PROVIDER, provider)
            .with_meta(meta::ACCOUNT, self.email)
            .with_meta(meta::PREFIX, self.prefix)
            .with_meta(meta::PROXY_URL, self.proxy_url)
            .with_meta(meta::SIZE, self.size.map(|s| s.to_string()))
            .with_meta(meta::MODIFIED, self.modtime);
        if let Some(index) = self.auth_index {
            record = record.with_join_key(index);
        }
        record
    }
}

/// Body of `PATCH /auth-files/status`.
#[derive(Debug, Clone, Serialize)]
pub struct AuthFileStatusRequest<'a> {
    /// File name.
    pub name: &'a str,
    /// New disabled flag.
    pub disabled: bool,
}

// ============================================================================
// API Keys
// ============================================================================

/// One provider API-key config entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiKeyEntry {
    /// API key.
    #[serde(rename = "api-key", default)]
    pub api_key: String,
    /// Upstream base URL.
    #[serde(rename = "base-url", default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Routing prefix.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    /// Outbound proxy URL.
    #[serde(rename = "proxy-url", default, skip_serializing_if = "Option::is_none")]
    pub proxy_url: Option<String>,
    /// Excluded models; `*` disables the entry.
    #[serde(
        rename = "excluded-models",
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub excluded_models: Vec<String>,
    /// Fields this client does not interpret (headers, models, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ApiKeyEntry {
    /// Converts into a record at `index`.
    pub fn to_record(&self, provider: ApiKeyProvider, index: usize) -> CredentialRecord {
        let mut record = CredentialRecord::api_key(provider, index, self.api_key.clone())
            .with_join_key(self.api_key.clone())
            .with_excluded_models(self.excluded_models.clone())
            .with_meta(meta::BASE_URL, self.base_url.clone())
            .with_meta(meta::PREFIX, self.prefix.clone())
            .with_meta(meta::PROXY_URL, self.proxy_url.clone());
        if let Some(prefix) = self.prefix.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
            record = record.with_bucket_key(prefix);
        }
        record
    }

    /// Copies the editable fields of `record` onto this entry.
    pub fn apply_record(&mut self, record: &CredentialRecord) {
        if let Some(key) = record.api_key_value() {
            self.api_key = key.to_string();
        }
        self.base_url = record.meta(meta::BASE_URL).map(ToOwned::to_owned);
        self.prefix = record.prefix().map(ToOwned::to_owned);
        self.proxy_url = record.meta(meta::PROXY_URL).map(ToOwned::to_owned);
        self.excluded_models.clone_from(&record.excluded_models);
    }
}

/// Extracts the entry list from `GET /<provider>-api-key`.
///
/// The server wraps the list under the config key; a bare array or a
/// `null` list are accepted too.
pub fn parse_api_key_list(
    provider: ApiKeyProvider,
    value: Value,
) -> Result<Vec<ApiKeyEntry>, serde_json::Error> {
    let list = match value {
        Value::Object(mut map) => map.remove(&provider.config_key()).unwrap_or(Value::Null),
        other => other,
    };
    match list {
        Value::Null => Ok(Vec::new()),
        other => serde_json::from_value(other),
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_auth_files_parse_and_convert() {
        let response: AuthFilesResponse = serde_json::from_value(json!({
            "files": [
                {"name": "alice.json", "type": "gemini", "auth_index": 3, "size": 512,
                 "email": "alice@example.com", "disabled": true},
                {"name": "bob.json", "provider": "claude", "auth_index": "7"}
            ]
        }))
        .unwrap();

        let records: Vec<_> = response.files.into_iter().map(AuthFileEntry::into_record).collect();
        assert_eq!(records[0].id, "alice.json");
        assert!(records[0].disabled);
        assert_eq!(records[0].join_key.as_deref(), Some("3"));
        assert_eq!(records[0].bucket_key.as_deref(), Some("alice.json"));
        assert_eq!(records[0].provider(), Some("gemini"));
        assert_eq!(records[0].meta(meta::SIZE), Some("512"));
        assert_eq!(records[1].join_key.as_deref(), Some("7"));
        assert_eq!(records[1].provider(), Some("claude"));
    }

    #[test]
    fn test_null_flags_read_as_defaults() {
        let response: AuthFilesResponse = serde_json::from_value(json!({
            "files": [{"name": "alice.json", "disabled": null}]
        }))
        .unwrap();
        assert!(!response.files[0].disabled);

        let entry: ApiKeyEntry =
            serde_json::from_value(json!({"api-key": "sk-1", "excluded-models": null})).unwrap();
        assert!(entry.excluded_models.is_empty());
        assert!(entry.extra.is_empty());
    }

    #[test]
    fn test_auth_files_missing_list() {
        let response: AuthFilesResponse = serde_json::from_str("{}").unwrap();
        assert!(response.files.is_empty());
    }

    #[test]
    fn test_api_key_list_wrapped_and_bare() {
        let wrapped = json!({"codex-api-key": [{"api-key": "sk-1", "prefix": "a"}]});
        let entries = parse_api_key_list(ApiKeyProvider::Codex, wrapped).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].prefix.as_deref(), Some("a"));

        let bare = json!([{"api-key": "sk-1"}, {"api-key": "sk-2"}]);
        assert_eq!(parse_api_key_list(ApiKeyProvider::Codex, bare).unwrap().len(), 2);

        let null = json!({"codex-api-key": null});
        assert!(parse_api_key_list(ApiKeyProvider::Codex, null).unwrap().is_empty());
    }

    #[test]
    fn test_api_key_entry_keeps_unknown_fields() {
        let entry: ApiKeyEntry = serde_json::from_value(json!({
            "api-key": "sk-1",
            "headers": {"X-Team": "a"},
            "excluded-models": ["gpt-4"]
        }))
        .unwrap();

        let mut record = entry.to_record(ApiKeyProvider::Codex, 0);
        record.set_enabled(false);

        let mut saved = entry.clone();
        saved.apply_record(&record);
        let value = serde_json::to_value(&saved).unwrap();
        assert_eq!(value["headers"], json!({"X-Team": "a"}));
        assert_eq!(value["excluded-models"], json!(["gpt-4", "*"]));
        assert!(value.get("base-url").is_none());
    }

    #[test]
    fn test_api_key_record_keys() {
        let entry = ApiKeyEntry {
            api_key: "sk-1".into(),
            prefix: Some(" team ".into()),
            ..Default::default()
        };
        let record = entry.to_record(ApiKeyProvider::Claude, 4);
        assert_eq!(record.id, "4");
        assert_eq!(record.join_key.as_deref(), Some("sk-1"));
        assert_eq!(record.bucket_key.as_deref(), Some("team"));
    }
}
