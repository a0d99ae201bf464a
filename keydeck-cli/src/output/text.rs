//! Text output formatting with bars and colors.

use keydeck_core::{
    ChartSeries, CredentialRecord, KeyStats, RecordKind, Severity, StatBucket, UsageSummary,
};
use keydeck_store::{MutationOutcome, SkipReason};

// ============================================================================
// ANSI Colors
// ============================================================================

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";

const BAR_FULL: char = '█';

/// Text formatter with optional colors.
pub struct TextFormatter {
    use_colors: bool,
    bar_width: usize,
}

impl TextFormatter {
    /// Creates a new text formatter.
    pub fn new(use_colors: bool) -> Self {
        Self {
            use_colors,
            bar_width: 30,
        }
    }

    /// Set the chart bar width.
    #[allow(dead_code)]
    pub fn with_bar_width(mut self, width: usize) -> Self {
        self.bar_width = width;
        self
    }

    // ========================================================================
    // Credential List
    // ========================================================================

    /// Formats the list header: "Auth files (3 of 5)".
    pub fn format_list_header(&self, title: &str, shown: usize, total: usize) -> String {
        let count = if shown == total {
            format!("({total})")
        } else {
            format!("({shown} of {total})")
        };
        format!("{} {}", self.bold(title), self.dim(&count))
    }

    /// Formats one credential line.
    pub fn format_record(&self, record: &CredentialRecord) -> String {
        let state = if record.disabled {
            self.red("disabled")
        } else {
            self.green("enabled ")
        };

        let detail = match record.kind {
            RecordKind::AuthFile => record.provider().unwrap_or("-").to_string(),
            RecordKind::ApiKey { .. } => record.masked_key(),
        };

        let mut line = format!(
            "  {:<4} {} {:<28} {:<16} {}",
            record.id,
            state,
            record.display_name(),
            detail,
            self.format_counts(record.stats),
        );
        if let Some(prefix) = record.prefix().filter(|p| !p.trim().is_empty()) {
            line.push_str(&self.dim(&format!("  prefix={prefix}")));
        }
        line
    }

    /// Formats success/failure counts: "✓ 12  ✗ 3".
    pub fn format_counts(&self, stats: StatBucket) -> String {
        format!(
            "{}  {}",
            self.green(&format!("✓ {}", stats.success)),
            self.red(&format!("✗ {}", stats.failure))
        )
    }

    // ========================================================================
    // Chart
    // ========================================================================

    /// Formats the chart as horizontal stacked bars scaled to the largest total.
    pub fn format_chart(&self, series: &ChartSeries) -> String {
        if series.is_empty() {
            return self.dim("No requests recorded");
        }

        let max_total = series
            .success
            .iter()
            .zip(&series.failure)
            .map(|(s, f)| s + f)
            .max()
            .unwrap_or(0)
            .max(1);
        let label_width = series.labels.iter().map(|l| l.chars().count()).max().unwrap_or(0);

        let mut lines = Vec::with_capacity(series.len());
        for ((label, success), failure) in series
            .labels
            .iter()
            .zip(&series.success)
            .zip(&series.failure)
        {
            let ok_cells = self.scale(*success, max_total);
            let fail_cells = self.scale(*failure, max_total);
            let bar = format!(
                "{}{}",
                self.green(&BAR_FULL.to_string().repeat(ok_cells)),
                self.red(&BAR_FULL.to_string().repeat(fail_cells))
            );
            let padding = " ".repeat(self.bar_width.saturating_sub(ok_cells + fail_cells));
            lines.push(format!(
                "  {label:<label_width$} {bar}{padding} {success}/{failure}"
            ));
        }
        lines.join("\n")
    }

    /// Number of bar cells for `value`; any nonzero value gets at least one.
    pub fn scale(&self, value: u64, max_total: u64) -> usize {
        if value == 0 {
            return 0;
        }
        #[allow(clippy::cast_possible_truncation)]
        let cells = (value.saturating_mul(self.bar_width as u64) / max_total.max(1)) as usize;
        cells.max(1)
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Formats a mutation outcome.
    pub fn format_outcome(&self, outcome: &MutationOutcome) -> String {
        match outcome {
            MutationOutcome::Skipped { reason } => self.yellow(&format!(
                "Skipped: {}",
                match reason {
                    SkipReason::Disconnected => "server not connected",
                    SkipReason::SaveInFlight => "another change is still saving",
                    SkipReason::NotFound => "no matching credential",
                }
            )),
            MutationOutcome::Committed => self.green("Saved"),
            MutationOutcome::RolledBack { reason } => {
                self.red(&format!("Rolled back: {reason}"))
            }
            MutationOutcome::Batch {
                success,
                fail,
                rolled_back,
            } => {
                let text = format!("{success} succeeded, {fail} failed");
                if *rolled_back {
                    self.red(&format!("{text}; all changes rolled back"))
                } else {
                    self.green(&text)
                }
            }
        }
    }

    /// Formats a notification line.
    pub fn format_notification(&self, message: &str, severity: Severity) -> String {
        match severity {
            Severity::Success => format!("{} {message}", self.green("✓")),
            Severity::Warning => format!("{} {message}", self.yellow("!")),
            Severity::Error => format!("{} {message}", self.red("✗")),
        }
    }

    // ========================================================================
    // Stats
    // ========================================================================

    /// Formats usage totals and the per-source buckets.
    pub fn format_stats(&self, summary: &UsageSummary, keys: &KeyStats) -> String {
        let mut lines = vec![
            self.bold("Usage"),
            format!("  Requests: {}", summary.total_requests),
            format!(
                "  {}",
                self.format_counts(StatBucket::new(summary.success_count, summary.failure_count))
            ),
            format!("  Tokens:   {}", summary.total_tokens),
        ];

        let mut sources: Vec<_> = keys.by_source.iter().collect();
        sources.sort_by(|a, b| b.1.total().cmp(&a.1.total()).then(a.0.cmp(b.0)));
        if !sources.is_empty() {
            lines.push(String::new());
            lines.push(self.bold("By source"));
            for (source, bucket) in sources {
                lines.push(format!("  {source:<32} {}", self.format_counts(*bucket)));
            }
        }
        lines.join("\n")
    }

    /// Formats an error message.
    pub fn format_error(&self, error: &str) -> String {
        format!("{} {}", self.red("Error:"), error)
    }

    // ========================================================================
    // Color Helpers
    // ========================================================================

    fn paint(&self, code: &str, text: &str) -> String {
        if self.use_colors {
            format!("{code}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    fn bold(&self, text: &str) -> String {
        self.paint(BOLD, text)
    }

    fn dim(&self, text: &str) -> String {
        self.paint(DIM, text)
    }

    fn green(&self, text: &str) -> String {
        self.paint(GREEN, text)
    }

    fn yellow(&self, text: &str) -> String {
        self.paint(YELLOW, text)
    }

    fn red(&self, text: &str) -> String {
        self.paint(RED, text)
    }
}
