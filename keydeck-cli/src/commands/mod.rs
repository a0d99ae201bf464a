//! CLI command implementations.

pub mod chart;
pub mod config;
pub mod list;
pub mod stats;
pub mod toggle;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use keydeck_core::{ApiKeyProvider, CredentialBackend};
use keydeck_fetch::{ApiKeyBackend, AuthFilesBackend, ManagementClient, UsageApi};
use keydeck_store::{
    Catalog, Config, ConnectionStatus, CredentialPanel, MemoryNotifier, PanelContext,
    TracingNotifier,
};
use tokio::sync::watch;
use tracing::debug;

use crate::Cli;

// ============================================================================
// Source Selection
// ============================================================================

/// Which credential list a command works on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// Uploaded auth files.
    AuthFiles,
    /// A provider's API-key configs.
    ApiKeys(ApiKeyProvider),
}

impl FromStr for Source {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "auth-files" | "auth" | "files" => Ok(Source::AuthFiles),
            other => ApiKeyProvider::from_cli_name(other)
                .map(Source::ApiKeys)
                .ok_or_else(|| {
                    anyhow::anyhow!(
                        "Unknown source: {other}. Use: auth-files, gemini, claude, codex, vertex"
                    )
                }),
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::AuthFiles => write!(f, "auth-files"),
            Source::ApiKeys(provider) => write!(f, "{}", provider.cli_name()),
        }
    }
}

// ============================================================================
// Session
// ============================================================================

/// A mounted panel plus the collaborators the commands read back.
pub struct Session {
    /// The panel, already loaded.
    pub panel: CredentialPanel,
    /// Source the panel shows.
    pub source: Source,
    /// Notifications emitted by mutations.
    pub notifier: Arc<MemoryNotifier>,
    /// Kept alive so the panel sees the connection state.
    _connection: watch::Sender<ConnectionStatus>,
}

/// Loads the config file named on the command line, or the default one.
pub async fn load_config(cli: &Cli) -> Result<Config> {
    let config = match &cli.config {
        Some(path) => Config::load_from(path).await,
        None => Config::load().await,
    };
    config.context("Failed to load configuration")
}

/// Builds the management client from config and command-line overrides.
pub fn client(config: &Config, cli: &Cli) -> Result<Arc<ManagementClient>> {
    let base_url = cli.server.as_deref().unwrap_or(&config.server.base_url);
    let client = ManagementClient::with_timeout(
        base_url,
        config.server.resolve_management_key(),
        Duration::from_secs(config.server.timeout_secs),
    )
    .with_context(|| format!("Invalid server URL: {base_url}"))?;
    debug!(base = %client.base_url(), "Management client ready");
    Ok(Arc::new(client))
}

/// Opens and mounts a panel for the selected source.
pub async fn open(cli: &Cli) -> Result<Session> {
    let config = load_config(cli).await?;
    let source: Source = cli
        .source
        .as_deref()
        .unwrap_or(&config.panel.default_source)
        .parse()?;
    let client = client(&config, cli)?;

    let backend: Arc<dyn CredentialBackend> = match source {
        Source::AuthFiles => Arc::new(AuthFilesBackend::new(client.clone())),
        Source::ApiKeys(provider) => Arc::new(ApiKeyBackend::new(client.clone(), provider)),
    };
    let options = config.panel.options_for(backend.persist_mode());

    let notifier = Arc::new(MemoryNotifier::forwarding(Arc::new(TracingNotifier)));
    let (connection, receiver) = watch::channel(ConnectionStatus::Connecting);
    let context = PanelContext::new(
        notifier.clone(),
        Arc::new(Catalog::new(config.panel.language)),
        receiver,
    );

    let panel =
        CredentialPanel::with_options(backend, Arc::new(UsageApi::new(client)), context, options);
    panel.mount().await;

    let status = if panel.error().await.is_none() {
        ConnectionStatus::Connected
    } else {
        ConnectionStatus::Disconnected
    };
    connection.send_replace(status);
    debug!(source = %source, status = ?status, "Panel mounted");

    Ok(Session {
        panel,
        source,
        notifier,
        _connection: connection,
    })
}
