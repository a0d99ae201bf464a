//! Config command - manage configuration.

use anyhow::Result;
use clap::{Args, Subcommand};
use keydeck_store::{default_config_dir, Config};
use tracing::info;

use super::load_config;
use crate::output::JsonFormatter;
use crate::{Cli, ExitCode, OutputFormat};

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Config subcommands.
#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration.
    Show,

    /// Show configuration paths.
    Path,

    /// Write a default configuration file.
    Init {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}

/// Runs the config command.
pub async fn run(args: &ConfigArgs, cli: &Cli) -> Result<ExitCode> {
    match &args.action {
        ConfigAction::Show => show_config(cli).await,
        ConfigAction::Path => show_paths(cli),
        ConfigAction::Init { force } => init_config(*force, cli).await,
    }
}

async fn show_config(cli: &Cli) -> Result<ExitCode> {
    let mut config = load_config(cli).await?;
    if config.server.management_key.is_some() {
        config.server.management_key = Some("********".to_string());
    }

    match cli.format {
        OutputFormat::Text => {
            let key_state = if config.server.resolve_management_key().is_some() {
                "set"
            } else {
                "not set"
            };
            println!("Keydeck Configuration");
            println!("{}", "─".repeat(40));
            println!();
            println!("Server:          {}", config.server.base_url);
            println!(
                "Management key:  {key_state} (env {})",
                config.server.management_key_env
            );
            println!("Timeout:         {}s", config.server.timeout_secs);
            println!();
            println!("Default source:  {}", config.panel.default_source);
            println!("Language:        {}", config.panel.language);
            if let Some(cap) = config.panel.chart_cap {
                println!("Chart cap:       {cap}");
            }
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(&config)?);
        }
    }

    Ok(ExitCode::Success)
}

fn show_paths(cli: &Cli) -> Result<ExitCode> {
    let config_dir = default_config_dir();
    let config_path = config_path(cli);

    match cli.format {
        OutputFormat::Text => {
            println!("Configuration Paths");
            println!("{}", "─".repeat(40));
            println!();
            println!("Config dir:  {}", config_dir.display());
            println!("Config file: {}", config_path.display());
        }
        OutputFormat::Json => {
            let paths = serde_json::json!({
                "config_dir": config_dir.display().to_string(),
                "config_file": config_path.display().to_string(),
            });
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(&paths)?);
        }
    }

    Ok(ExitCode::Success)
}

async fn init_config(force: bool, cli: &Cli) -> Result<ExitCode> {
    let path = config_path(cli);
    if path.exists() && !force {
        anyhow::bail!(
            "Config file already exists: {} (use --force to overwrite)",
            path.display()
        );
    }

    let mut config = Config::default();
    if let Some(server) = &cli.server {
        config.server.base_url.clone_from(server);
    }
    if let Some(source) = &cli.source {
        config.panel.default_source.clone_from(source);
    }
    config.save_to(&path).await?;

    info!(path = %path.display(), "Config initialized");
    if !cli.quiet {
        println!("Wrote {}", path.display());
    }
    Ok(ExitCode::Success)
}

fn config_path(cli: &Cli) -> std::path::PathBuf {
    cli.config.clone().unwrap_or_else(Config::default_path)
}
