//! Management API client.

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, header};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::error::FetchError;

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Path prefix of every management endpoint.
const MANAGEMENT_PATH: &str = "v0/management/";

/// User agent string for Keydeck.
const USER_AGENT: &str = concat!("keydeck/", env!("CARGO_PKG_VERSION"));

/// HTTP client for the proxy management API.
///
/// Every request carries the management key as a bearer token. There is no
/// retry; callers surface failures and let the user refresh.
#[derive(Debug, Clone)]
pub struct ManagementClient {
    inner: Client,
    base: Url,
    management_key: Option<String>,
}

impl ManagementClient {
    /// Creates a client for `base_url` with the default timeout.
    pub fn new(base_url: &str, management_key: Option<String>) -> Result<Self, FetchError> {
        Self::with_timeout(
            base_url,
            management_key,
            Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        )
    }

    /// Creates a client with a custom timeout.
    pub fn with_timeout(
        base_url: &str,
        management_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, FetchError> {
        let inner = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            inner,
            base: management_base(base_url)?,
            management_key: management_key.filter(|k| !k.trim().is_empty()),
        })
    }

    /// Returns the management base URL (ends in `/v0/management/`).
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Resolves an endpoint path relative to the management base.
    pub fn endpoint(&self, path: &str) -> Result<Url, FetchError> {
        self.base
            .join(path.trim_start_matches('/'))
            .map_err(|e| FetchError::InvalidUrl(e.to_string()))
    }

    /// Performs a GET request and decodes the JSON body.
    #[instrument(skip(self))]
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, FetchError> {
        let response = self.send(self.request(Method::GET, path)?).await?;
        Ok(response.json().await?)
    }

    /// Performs a PUT request with a JSON body.
    #[instrument(skip(self, body))]
    pub async fn put_json<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<(), FetchError> {
        self.send(self.request(Method::PUT, path)?.json(body)).await?;
        Ok(())
    }

    /// Performs a PATCH request with a JSON body.
    #[instrument(skip(self, body))]
    pub async fn patch_json<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<(), FetchError> {
        self.send(self.request(Method::PATCH, path)?.json(body)).await?;
        Ok(())
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, FetchError> {
        let url = self.endpoint(path)?;
        debug!(method = %method, url = %url, "Management request");

        let builder = self.inner.request(method, url);
        Ok(match &self.management_key {
            Some(key) => builder.header(header::AUTHORIZATION, format!("Bearer {key}")),
            None => builder,
        })
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, FetchError> {
        let response = builder.send().await?;
        let status = response.status();
        debug!(status = %status, "Response received");

        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = error_message(&body).unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("unknown error")
                .to_string()
        });
        warn!(status = %status, message = %message, "Management request failed");

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(FetchError::AuthenticationFailed(message));
        }
        Err(FetchError::Status {
            status: status.as_u16(),
            message,
        })
    }
}

/// Normalizes a user-supplied base URL to the management base.
///
/// Accepts a bare host (`localhost:8317`), a server root, or a URL that
/// already ends in `/v0/management`.
fn management_base(base_url: &str) -> Result<Url, FetchError> {
    let trimmed = base_url.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(FetchError::InvalidUrl("empty base URL".to_string()));
    }

    let with_scheme = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("http://{trimmed}")
    };
    let root = with_scheme
        .strip_suffix("/v0/management")
        .unwrap_or(&with_scheme);

    Url::parse(&format!("{root}/"))
        .and_then(|url| url.join(MANAGEMENT_PATH))
        .map_err(|e| FetchError::InvalidUrl(e.to_string()))
}

/// Extracts `error` or `message` from a JSON error body; plain text is used as is.
fn error_message(body: &str) -> Option<String> {
    let text = body.trim();
    if text.is_empty() {
        return None;
    }
    match serde_json::from_str::<serde_json::Value>(text) {
        Ok(value) => ["error", "message"]
            .iter()
            .find_map(|field| value.get(*field)?.as_str().map(ToOwned::to_owned)),
        Err(_) => Some(text.to_string()),
    }
}
