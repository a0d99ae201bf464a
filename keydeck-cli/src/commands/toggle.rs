//! Enable/disable commands.

use anyhow::Result;
use clap::Args;
use keydeck_store::MutationOutcome;
use tracing::info;

use super::list::{report_load_error, FilterArgs};
use super::open;
use crate::output::{JsonFormatter, TextFormatter};
use crate::{Cli, ExitCode, OutputFormat};

/// Arguments for enable and disable.
#[derive(Args)]
pub struct ToggleArgs {
    /// Record ids: file names for auth files, list indexes for API keys.
    #[arg(required_unless_present = "all")]
    pub ids: Vec<String>,

    /// Apply to every record matching the filter flags.
    #[arg(long)]
    pub all: bool,

    #[command(flatten)]
    pub filter: FilterArgs,
}

/// Runs enable (`enabled = true`) or disable.
pub async fn run(args: &ToggleArgs, enabled: bool, cli: &Cli) -> Result<ExitCode> {
    let filter = args.filter.to_state()?;
    let session = open(cli).await?;
    if let Some(code) = report_load_error(&session, cli).await {
        return Ok(code);
    }
    let panel = &session.panel;

    let outcome = if args.all {
        panel.set_filter(filter).await;
        panel.toggle_all().await;
        panel.set_enabled_selected(enabled).await
    } else if let [id] = args.ids.as_slice() {
        panel.set_enabled(id, enabled).await
    } else {
        for id in &args.ids {
            panel.toggle_selection(id).await;
        }
        panel.set_enabled_selected(enabled).await
    };
    info!(source = %session.source, enabled, outcome = ?outcome, "Mutation settled");

    let notifications = session.notifier.take();
    match cli.format {
        OutputFormat::Text => {
            let formatter = TextFormatter::new(!cli.no_color);
            if !cli.quiet {
                for (message, severity) in &notifications {
                    println!("{}", formatter.format_notification(message, *severity));
                }
            }
            println!("{}", formatter.format_outcome(&outcome));
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!(
                "{}",
                formatter.format_outcome(enabled, &outcome, &notifications)?
            );
        }
    }

    Ok(exit_code(&outcome))
}

fn exit_code(outcome: &MutationOutcome) -> ExitCode {
    match outcome {
        MutationOutcome::Committed => ExitCode::Success,
        MutationOutcome::Batch { rolled_back, .. } if !rolled_back => ExitCode::Success,
        MutationOutcome::Skipped { .. } => ExitCode::Error,
        _ => ExitCode::RolledBack,
    }
}
