//! Stats command - usage totals and per-source buckets.

use anyhow::{Context, Result};
use keydeck_core::UsageSource;
use keydeck_fetch::UsageApi;
use tracing::info;

use super::{client, load_config};
use crate::output::{JsonFormatter, TextFormatter};
use crate::{Cli, ExitCode, OutputFormat};

/// Runs the stats command.
pub async fn run(cli: &Cli) -> Result<ExitCode> {
    let config = load_config(cli).await?;
    let usage = UsageApi::new(client(&config, cli)?);

    let blob = usage.usage().await.context("Failed to fetch usage")?;
    let keys = blob.key_stats();
    info!(
        total_requests = blob.usage.total_requests,
        sources = keys.by_source.len(),
        "Fetched usage"
    );

    match cli.format {
        OutputFormat::Text => {
            let formatter = TextFormatter::new(!cli.no_color);
            println!("{}", formatter.format_stats(&blob.usage, &keys));
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format_stats(&blob.usage, &keys)?);
        }
    }
    Ok(ExitCode::Success)
}
