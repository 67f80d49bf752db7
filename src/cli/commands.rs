//! CLI command implementations.
//!
//! Contains the business logic for each CLI command.

use std::fmt::Write as _;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::agent::{Orchestrator, ProgressObserver, PromptSet, ResearchConfig};
use crate::cli::output::{OutputFormat, format_report, to_json};
use crate::cli::parser::{Cli, Commands, PromptsCommands};
use crate::core::{ReportType, RunParams, Tone};
use crate::error::{CommandError, Result};

/// Parameters for the `run` command.
#[derive(Debug, Clone)]
pub struct RunCommandParams<'a> {
    /// Research topic.
    pub query: &'a str,
    /// Report type name.
    pub report_type: &'a str,
    /// Optional tone name.
    pub tone: Option<&'a str>,
    /// Maximum planned search queries.
    pub max_sub_queries: usize,
    /// Maximum sub-topics for detailed reports.
    pub max_subtopics: usize,
    /// Search results per query.
    pub max_results: usize,
    /// Report destination; stdout when `None`.
    pub output: Option<&'a Path>,
    /// Suppress progress on stderr.
    pub quiet: bool,
    /// List degradation notices after the report.
    pub verbose: bool,
}

impl RunCommandParams<'_> {
    /// Parses names into typed run parameters.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown report type or tone.
    pub fn to_run_params(&self) -> Result<RunParams> {
        let report_type: ReportType = self.report_type.parse()?;
        let tone = self.tone.map(str::parse::<Tone>).transpose()?;
        Ok(RunParams::new(self.query)
            .report_type(report_type)
            .tone(tone)
            .max_sub_queries(self.max_sub_queries)
            .max_subtopics(self.max_subtopics)
            .max_results_per_query(self.max_results))
    }
}

/// Executes the CLI command.
///
/// # Arguments
///
/// * `cli` - Parsed CLI arguments.
///
/// # Returns
///
/// Result with output string on success.
///
/// # Errors
///
/// Returns an error if the command fails to execute.
pub fn execute(cli: &Cli) -> Result<String> {
    let format = OutputFormat::parse(&cli.format);

    match &cli.command {
        Commands::Run {
            query,
            report_type,
            tone,
            max_subqueries,
            max_subtopics,
            max_results,
            output,
            quiet,
        } => {
            let params = RunCommandParams {
                query,
                report_type,
                tone: tone.as_deref(),
                max_sub_queries: *max_subqueries,
                max_subtopics: *max_subtopics,
                max_results: *max_results,
                output: output.as_deref(),
                quiet: *quiet,
                verbose: cli.verbose,
            };
            cmd_run(&params, format)
        }
        Commands::Prompts(PromptsCommands::Init { dir }) => {
            cmd_init_prompts(dir.as_deref(), format)
        }
        Commands::Prompts(PromptsCommands::Show { name }) => {
            cmd_show_prompts(name.as_deref(), format)
        }
    }
}

// ==================== Research Command ====================

fn cmd_run(params: &RunCommandParams<'_>, format: OutputFormat) -> Result<String> {
    let run_params = params.to_run_params()?;

    let config = ResearchConfig::builder().from_env().build().map_err(|e| {
        CommandError::ExecutionFailed(format!("Research configuration error: {e}"))
    })?;

    // Reject bad input before any client is constructed.
    run_params.validate(&config.bounds)?;

    let orchestrator = Orchestrator::from_config(config)?;

    let progress: Option<Arc<dyn ProgressObserver>> = if params.quiet {
        None
    } else {
        Some(Arc::new(|message: &str| {
            let _ = writeln!(std::io::stderr().lock(), "{message}");
        }))
    };

    // Create tokio runtime as sync/async bridge
    let rt = tokio::runtime::Runtime::new().map_err(|e| {
        CommandError::ExecutionFailed(format!("Failed to create async runtime: {e}"))
    })?;

    let report = rt.block_on(orchestrator.run(&run_params, progress))?;
    let rendered = format_report(&report, format, params.verbose)?;

    match params.output {
        None => Ok(rendered),
        Some(path) => {
            std::fs::write(path, format!("{rendered}\n"))?;
            match format {
                OutputFormat::Text => Ok(format!("Report written to: {}", path.display())),
                OutputFormat::Json => to_json(&serde_json::json!({
                    "written": path.display().to_string(),
                    "session_id": report.stats().session_id,
                })),
            }
        }
    }
}

// ==================== Prompt Commands ====================

fn cmd_init_prompts(dir: Option<&Path>, format: OutputFormat) -> Result<String> {
    let target_dir = dir
        .map(PathBuf::from)
        .or_else(PromptSet::default_dir)
        .ok_or_else(|| {
            CommandError::ExecutionFailed(
                "Could not determine config directory for default prompt path".to_string(),
            )
        })?;

    let written = PromptSet::write_defaults(&target_dir).map_err(|e| {
        CommandError::ExecutionFailed(format!("Failed to write prompt templates: {e}"))
    })?;

    match format {
        OutputFormat::Text => {
            if written.is_empty() {
                return Ok(format!(
                    "All prompt templates already exist in: {}",
                    target_dir.display()
                ));
            }
            let mut output = format!(
                "Wrote {} prompt template(s) to: {}",
                written.len(),
                target_dir.display()
            );
            for path in &written {
                let name = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or("unknown");
                let _ = write!(output, "\n  {name}");
            }
            Ok(output)
        }
        OutputFormat::Json => {
            let files: Vec<String> = written.iter().map(|p| p.display().to_string()).collect();
            to_json(&serde_json::json!({
                "directory": target_dir.display().to_string(),
                "written": files,
            }))
        }
    }
}

fn cmd_show_prompts(name: Option<&str>, format: OutputFormat) -> Result<String> {
    let dir = std::env::var("LITE_RESEARCH_PROMPT_DIR").ok().map(PathBuf::from);
    let prompts = PromptSet::load(dir.as_deref());
    let entries = prompts.entries();

    let selected: Vec<(&str, &str)> = match name {
        None => entries.to_vec(),
        Some(wanted) => {
            let wanted = wanted.trim().trim_end_matches(".md");
            let found: Vec<(&str, &str)> = entries
                .iter()
                .copied()
                .filter(|(file, _)| file.trim_end_matches(".md") == wanted)
                .collect();
            if found.is_empty() {
                let known: Vec<&str> = entries
                    .iter()
                    .map(|(file, _)| file.trim_end_matches(".md"))
                    .collect();
                return Err(CommandError::InvalidArgument(format!(
                    "unknown prompt '{wanted}' (expected one of: {})",
                    known.join(", ")
                ))
                .into());
            }
            found
        }
    };

    match format {
        OutputFormat::Text => Ok(selected
            .iter()
            .map(|(file, body)| format!("==> {file} <==\n{}", body.trim_end()))
            .collect::<Vec<_>>()
            .join("\n\n")),
        OutputFormat::Json => {
            let map: serde_json::Map<String, serde_json::Value> = selected
                .iter()
                .map(|(file, body)| {
                    (
                        file.trim_end_matches(".md").to_string(),
                        serde_json::Value::String((*body).to_string()),
                    )
                })
                .collect();
            to_json(&map)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, ResearchError};

    fn params(report_type: &'static str, tone: Option<&'static str>) -> RunCommandParams<'static> {
        RunCommandParams {
            query: "battery recycling",
            report_type,
            tone,
            max_sub_queries: 4,
            max_subtopics: 2,
            max_results: 6,
            output: None,
            quiet: true,
            verbose: false,
        }
    }

    #[test]
    fn test_run_params_are_parsed() {
        let run = params("outline", Some("formal"))
            .to_run_params()
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(run.report_type, ReportType::Outline);
        assert_eq!(run.tone, Some(Tone::Formal));
        assert_eq!(run.max_sub_queries, 4);
        assert_eq!(run.max_subtopics, 2);
        assert_eq!(run.max_results_per_query, 6);
    }

    #[test]
    fn test_unknown_report_type_is_validation_error() {
        let err = params("essay", None).to_run_params();
        assert!(matches!(
            err,
            Err(Error::Research(ResearchError::Validation { .. }))
        ));
    }

    #[test]
    fn test_init_prompts_writes_then_skips() {
        let dir = tempfile::tempdir().unwrap_or_else(|_| unreachable!());
        let first = cmd_init_prompts(Some(dir.path()), OutputFormat::Text)
            .unwrap_or_else(|_| unreachable!());
        assert!(first.starts_with("Wrote 10 prompt template(s)"));
        assert!(dir.path().join("sub_queries.md").exists());

        let second = cmd_init_prompts(Some(dir.path()), OutputFormat::Text)
            .unwrap_or_else(|_| unreachable!());
        assert!(second.starts_with("All prompt templates already exist"));
    }

    #[test]
    fn test_show_single_prompt() {
        let out = cmd_show_prompts(Some("subtopics"), OutputFormat::Json)
            .unwrap_or_else(|_| unreachable!());
        let value: serde_json::Value = serde_json::from_str(&out).unwrap_or_else(|_| unreachable!());
        let keys: Vec<&String> = value.as_object().map(|m| m.keys().collect()).unwrap_or_default();
        assert_eq!(keys, vec!["subtopics"]);
    }

    #[test]
    fn test_show_unknown_prompt() {
        assert!(matches!(
            cmd_show_prompts(Some("nope"), OutputFormat::Text),
            Err(Error::Command(CommandError::InvalidArgument(_)))
        ));
    }
}
