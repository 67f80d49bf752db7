//! Command-line argument parsing.
//!
//! Defines the CLI structure using clap derive macros.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// lite-research: automated topic research.
///
/// Plans search queries for a topic, retrieves and compresses web content,
/// then writes a structured report with an LLM.
#[derive(Parser, Debug)]
#[command(name = "lite-research")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json).
    #[arg(long, default_value = "text", global = true)]
    pub format: String,

    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Research a topic and print the report.
    ///
    /// Requires an `OpenAI`-compatible API key (`OPENAI_API_KEY`) and a
    /// Tavily key (`TAVILY_API_KEY`). DuckDuckGo is used as the fallback
    /// search backend.
    #[command(after_help = r#"Examples:
  lite-research run "solid-state battery recycling"
  lite-research run "EU AI act obligations" --report-type outline --tone formal
  lite-research run "urban heat islands" --report-type detailed --max-subtopics 4
  lite-research --format json run "rust async runtimes" --output report.json
"#)]
    Run {
        /// Research topic.
        query: String,

        /// Report type (research, resource, outline, detailed, custom).
        #[arg(short = 't', long, default_value = "research")]
        report_type: String,

        /// Writing tone (objective, formal, analytical, ...).
        #[arg(long)]
        tone: Option<String>,

        /// Maximum search queries planned per run.
        #[arg(long, default_value = "3")]
        max_subqueries: usize,

        /// Maximum sub-topics for detailed reports.
        #[arg(long, default_value = "3")]
        max_subtopics: usize,

        /// Search results fetched per query.
        #[arg(long, default_value = "5")]
        max_results: usize,

        /// Write the report to a file instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Suppress progress messages on stderr.
        #[arg(short, long)]
        quiet: bool,
    },

    /// Manage prompt templates.
    #[command(subcommand)]
    Prompts(PromptsCommands),
}

/// Prompt template subcommands.
#[derive(Subcommand, Debug)]
pub enum PromptsCommands {
    /// Write the built-in prompt templates to a directory for customization.
    ///
    /// Existing files are left untouched. Point `LITE_RESEARCH_PROMPT_DIR`
    /// at the directory to use the edited templates.
    #[command(after_help = r#"Examples:
  lite-research prompts init
  lite-research prompts init --dir ./prompts
"#)]
    Init {
        /// Target directory. Defaults to the user config directory.
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },

    /// Print the active prompt templates.
    #[command(after_help = r#"Examples:
  lite-research prompts show
  lite-research prompts show sub_queries
"#)]
    Show {
        /// Template name (e.g. `auto_agent`, `subtopics`). Lists all when omitted.
        name: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_defaults() {
        let cli = Cli::try_parse_from(["lite-research", "run", "battery recycling"])
            .unwrap_or_else(|_| unreachable!());
        let Commands::Run {
            query,
            report_type,
            tone,
            max_subqueries,
            max_subtopics,
            max_results,
            output,
            quiet,
        } = cli.command
        else {
            unreachable!()
        };
        assert_eq!(query, "battery recycling");
        assert_eq!(report_type, "research");
        assert!(tone.is_none());
        assert_eq!((max_subqueries, max_subtopics, max_results), (3, 3, 5));
        assert!(output.is_none());
        assert!(!quiet);
        assert_eq!(cli.format, "text");
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "lite-research",
            "run",
            "topic",
            "-t",
            "detailed",
            "--format",
            "json",
            "-v",
        ])
        .unwrap_or_else(|_| unreachable!());
        assert!(cli.verbose);
        assert_eq!(cli.format, "json");
        assert!(matches!(cli.command, Commands::Run { ref report_type, .. } if report_type == "detailed"));
    }

    #[test]
    fn test_prompts_show_name() {
        let cli = Cli::try_parse_from(["lite-research", "prompts", "show", "subtopics"])
            .unwrap_or_else(|_| unreachable!());
        assert!(matches!(
            cli.command,
            Commands::Prompts(PromptsCommands::Show { name: Some(ref n) }) if n == "subtopics"
        ));
    }

    #[test]
    fn test_run_requires_query() {
        assert!(Cli::try_parse_from(["lite-research", "run"]).is_err());
    }
}
