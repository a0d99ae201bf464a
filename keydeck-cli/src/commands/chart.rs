//! Chart command - success/failure bars per credential.

use anyhow::Result;

use super::list::report_load_error;
use super::open;
use crate::output::{JsonFormatter, TextFormatter};
use crate::{Cli, ExitCode, OutputFormat};

/// Runs the chart command.
pub async fn run(cli: &Cli) -> Result<ExitCode> {
    let session = open(cli).await?;
    if let Some(code) = report_load_error(&session, cli).await {
        return Ok(code);
    }

    let series = session.panel.chart().await;
    match cli.format {
        OutputFormat::Text => {
            println!("{}", TextFormatter::new(!cli.no_color).format_chart(&series));
        }
        OutputFormat::Json => {
            println!("{}", JsonFormatter::new(cli.pretty).format(&series)?);
        }
    }
    Ok(ExitCode::Success)
}
