// Lint configuration for this crate
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! Keydeck CLI - manage proxy credentials from the command line.
//!
//! # Examples
//!
//! ```bash
//! # List auth files with their request counts
//! keydeck
//!
//! # List Gemini API keys, only the disabled ones
//! keydeck list --source gemini --status disabled
//!
//! # Disable two auth files
//! keydeck disable alice.json bob.json
//!
//! # Success/failure chart
//! keydeck chart
//!
//! # JSON output
//! keydeck --format json --pretty
//!
//! # Write a default config file
//! keydeck config init
//! ```

mod commands;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::{chart, config, list, stats, toggle};

// ============================================================================
// CLI Definition
// ============================================================================

/// Keydeck CLI - proxy credential management.
#[derive(Parser)]
#[command(name = "keydeck")]
#[command(about = "Credential management for the proxy management API")]
#[command(long_about = r#"
Keydeck lists, enables, and disables the credentials of a proxy server
through its management API, with per-credential request statistics.

Sources:
  • Auth files (auth-files)
  • Gemini API keys (gemini)
  • Claude API keys (claude)
  • Codex API keys (codex)
  • Vertex AI API keys (vertex)

Examples:
  keydeck                            # List auth files
  keydeck list --source claude       # List Claude API keys
  keydeck disable alice.json         # Disable one auth file
  keydeck enable --source codex 0 1  # Enable two Codex keys
  keydeck chart                      # Request chart
"#)]
#[command(version)]
#[command(author = "Keydeck Contributors")]
pub struct Cli {
    /// Subcommand to run. If none, runs 'list' by default.
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Output format (text or json).
    #[arg(long, short = 'f', default_value = "text", global = true)]
    pub format: OutputFormat,

    /// Pretty-print JSON output.
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Credential source: "auth-files" or a provider (gemini, claude, codex, vertex).
    #[arg(long, short, global = true)]
    pub source: Option<String>,

    /// Management server URL (overrides the config file).
    #[arg(long, global = true)]
    pub server: Option<String>,

    /// Config file path.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output (show debug info).
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Quiet mode (minimal output).
    #[arg(long, short, global = true)]
    pub quiet: bool,
}

/// CLI commands.
#[derive(Subcommand)]
pub enum Commands {
    /// List credentials (default if no command specified).
    #[command(visible_alias = "ls")]
    List(list::ListArgs),

    /// Enable credentials.
    Enable(toggle::ToggleArgs),

    /// Disable credentials.
    Disable(toggle::ToggleArgs),

    /// Show the success/failure chart.
    #[command(visible_alias = "c")]
    Chart,

    /// Show usage statistics.
    Stats,

    /// Manage configuration.
    Config(config::ConfigArgs),
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable text with colors.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}

/// CLI exit codes.
#[repr(i32)]
pub enum ExitCode {
    /// Success.
    Success = 0,
    /// General error.
    Error = 1,
    /// The credential list could not be loaded.
    LoadFailed = 2,
    /// A change was rolled back.
    RolledBack = 3,
}

// ============================================================================
// Logging Setup
// ============================================================================

fn setup_logging(verbose: bool, quiet: bool) {
    if quiet {
        return;
    }

    let filter = if verbose {
        EnvFilter::new("keydeck=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("keydeck=warn"))
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let result = match &cli.command {
        Some(Commands::List(args)) => list::run(args, &cli).await,
        Some(Commands::Enable(args)) => toggle::run(args, true, &cli).await,
        Some(Commands::Disable(args)) => toggle::run(args, false, &cli).await,
        Some(Commands::Chart) => chart::run(&cli).await,
        Some(Commands::Stats) => stats::run(&cli).await,
        Some(Commands::Config(args)) => config::run(args, &cli).await,
        None => list::run(&list::ListArgs::default(), &cli).await,
    };

    match result {
        Ok(ExitCode::Success) => Ok(()),
        Ok(code) => std::process::exit(code as i32),
        Err(e) => {
            if !cli.quiet {
                eprintln!("Error: {e:#}");
            }
            std::process::exit(ExitCode::Error as i32);
        }
    }
}
