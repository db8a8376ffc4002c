use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use graphdata_convert::{run, ConvertConfig, RunSummary, TracingReporter};
use tracing::{debug, error, Level};
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

/// Convert the graphData of every .js file below a directory into .json
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Directory to scan [default: current directory]
    root: Option<PathBuf>,
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run_cli(cli) {
        Ok(summary) => {
            debug!(?summary, "run finished");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Error processing files: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run_cli(cli: Cli) -> Result<RunSummary> {
    let root = match cli.root {
        Some(root) => root,
        None => std::env::current_dir().context("failed to resolve the current directory")?,
    };
    let config = ConvertConfig::new(root);
    let summary = run(&config, &mut TracingReporter)?;
    Ok(summary)
}

/// Warnings and errors go to stderr, everything else to stdout.
fn init_tracing() {
    let writer = std::io::stderr
        .with_max_level(Level::WARN)
        .or_else(std::io::stdout);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .without_time()
        .with_target(false)
        .with_level(false)
        .init();
}
