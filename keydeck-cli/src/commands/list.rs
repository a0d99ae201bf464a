//! List command - show credentials with request counts.

use anyhow::Result;
use clap::Args;
use keydeck_core::{FilterState, StatusFilter};
use tracing::info;

use super::{open, Session, Source};
use crate::output::{JsonFormatter, TextFormatter};
use crate::{Cli, ExitCode, OutputFormat};

/// Arguments for the list command.
#[derive(Args, Default)]
pub struct ListArgs {
    #[command(flatten)]
    pub filter: FilterArgs,
}

/// Filter flags shared by list and enable/disable.
#[derive(Args, Default, Clone)]
pub struct FilterArgs {
    /// Case-insensitive text search.
    #[arg(long)]
    pub search: Option<String>,

    /// Status filter: all, active, disabled.
    #[arg(long)]
    pub status: Option<String>,

    /// Exact prefix match.
    #[arg(long)]
    pub prefix: Option<String>,
}

impl FilterArgs {
    /// Builds the filter state.
    pub fn to_state(&self) -> Result<FilterState> {
        let mut state = FilterState::default();
        if let Some(search) = &self.search {
            state = state.with_search(search.clone());
        }
        if let Some(status) = &self.status {
            state = state.with_status(status.parse::<StatusFilter>()?);
        }
        if let Some(prefix) = &self.prefix {
            state = state.with_prefix(prefix.clone());
        }
        Ok(state)
    }
}

/// Runs the list command.
pub async fn run(args: &ListArgs, cli: &Cli) -> Result<ExitCode> {
    let filter = args.filter.to_state()?;
    let session = open(cli).await?;
    if let Some(code) = report_load_error(&session, cli).await {
        return Ok(code);
    }

    session.panel.set_filter(filter).await;
    let total = session.panel.records().await.len();
    let records = session.panel.view().await;
    info!(source = %session.source, total, shown = records.len(), "Listing credentials");

    match cli.format {
        OutputFormat::Text => {
            let formatter = TextFormatter::new(!cli.no_color);
            println!(
                "{}",
                formatter.format_list_header(&title(session.source), records.len(), total)
            );
            for record in &records {
                println!("{}", formatter.format_record(record));
            }
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            let updated_at = session.panel.last_refresh().await;
            println!(
                "{}",
                formatter.format_records(
                    &session.source.to_string(),
                    total,
                    updated_at,
                    &records
                )?
            );
        }
    }

    Ok(ExitCode::Success)
}

/// Prints the page-level load error, if any, and returns the exit code to use.
pub async fn report_load_error(session: &Session, cli: &Cli) -> Option<ExitCode> {
    let error = session.panel.error().await?;
    if !cli.quiet {
        match cli.format {
            OutputFormat::Text => {
                eprintln!("{}", TextFormatter::new(!cli.no_color).format_error(&error));
            }
            OutputFormat::Json => {
                let value = serde_json::json!({ "error": error });
                println!("{value}");
            }
        }
    }
    Some(ExitCode::LoadFailed)
}

fn title(source: Source) -> String {
    match source {
        Source::AuthFiles => "Auth files".to_string(),
        Source::ApiKeys(provider) => format!("{} API keys", provider.display_name()),
    }
}
