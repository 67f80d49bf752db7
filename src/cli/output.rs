//! Output formatting for CLI commands.

use std::fmt::Write as _;

use serde::Serialize;

use crate::core::Report;
use crate::error::{CommandError, Result};

/// Output format for command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// Pretty-printed JSON.
    Json,
}

impl OutputFormat {
    /// Parses a format name. Unknown names fall back to text.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Text,
        }
    }
}

/// Serializes a value as pretty JSON.
///
/// # Errors
///
/// Returns a command error if serialization fails.
pub fn to_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(|e| {
        CommandError::ExecutionFailed(format!("JSON serialization failed: {e}")).into()
    })
}

/// Formats a finished report.
///
/// Text output is the report body followed by a source list and a one-line
/// summary of the run. With `verbose`, every degradation notice is listed.
///
/// # Errors
///
/// Returns a command error if JSON serialization fails.
pub fn format_report(report: &Report, format: OutputFormat, verbose: bool) -> Result<String> {
    match format {
        OutputFormat::Json => to_json(report),
        OutputFormat::Text => {
            let stats = report.stats();
            let mut out = report.text();
            if !report.sources().is_empty() {
                out.push_str("\n\n---\nSources:\n");
                for url in report.sources() {
                    let _ = writeln!(out, "- {url}");
                }
            } else {
                out.push_str("\n\n---\n");
            }
            let _ = write!(
                out,
                "Agent: {} | Queries: {} | Hits: {} | Pages: {} | Chunks: {} | Tokens: {} | Warnings: {} | Time: {:.1}s",
                stats.agent,
                stats.sub_queries.len(),
                stats.search_hits,
                stats.documents,
                stats.chunks,
                stats.total_tokens,
                stats.degraded.len(),
                stats.elapsed.as_secs_f64()
            );
            if verbose {
                for notice in &stats.degraded {
                    let _ = write!(out, "\nWarning: {notice}");
                }
            }
            Ok(out)
        }
    }
}
