//! lite-research command-line entry point.

use std::io::Write;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use lite_research::cli::{Cli, execute};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let output = execute(&cli)?;
    if !output.is_empty() {
        writeln!(std::io::stdout().lock(), "{output}")?;
    }
    Ok(())
}

/// Logs go to stderr so stdout carries only command output.
///
/// `RUST_LOG` wins when set; otherwise warnings only, or debug for this crate
/// with `--verbose`.
fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose {
            "warn,lite_research=debug"
        } else {
            "warn"
        })
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
