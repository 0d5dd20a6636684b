// SPDX-FileCopyrightText: 2026 Triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Triage - multi-engine classifier for telecom customer-service messages.
//!
//! This is the binary entry point.

mod classify;
mod input;
mod probe;
mod shutdown;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use triage_config::TriageConfig;
use triage_core::TriageError;
use triage_orchestrator::Orchestrator;

use crate::classify::ClassifyArgs;
use crate::input::InputError;

/// Exit code used when a run was interrupted by a signal.
const EXIT_CANCELLED: u8 = 130;

/// Triage - classify customer-service messages by sentiment, claim and urgency.
#[derive(Parser, Debug)]
#[command(name = "triage", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the XDG hierarchy.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Classify a CSV or JSON-lines file and stream records as JSON lines.
    Classify(ClassifyArgs),
    /// Check whether the local and cloud LLM engines are reachable.
    Probe {
        /// Disable colored output.
        #[arg(long)]
        plain: bool,
    },
    /// Print the resolved configuration as TOML, secrets redacted.
    Config,
}

/// Errors surfaced by the command-line layer.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Triage(#[from] TriageError),

    #[error(transparent)]
    Input(#[from] InputError),

    #[error("failed to write output: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode record: {0}")]
    Json(serde_json::Error),

    #[error("failed to render configuration: {0}")]
    Toml(#[from] toml::ser::Error),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => triage_config::load_and_validate_path(path),
        None => triage_config::load_and_validate(),
    };
    let mut config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            triage_config::render_errors(&errors);
            return ExitCode::FAILURE;
        }
    };

    if let Commands::Classify(args) = &cli.command {
        args.apply(&mut config);
        if let Err(errors) = triage_config::validation::validate_config(&config) {
            triage_config::render_errors(&errors);
            return ExitCode::FAILURE;
        }
    }

    init_tracing(&config.general.log_level);

    match run(cli.command, &config).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("triage: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Commands, config: &TriageConfig) -> Result<ExitCode, CliError> {
    match command {
        Commands::Classify(args) => {
            let outcome = classify::run_classify(config, &args).await?;
            if !args.quiet {
                classify::print_summary(&outcome.report, outcome.total_documents);
            }
            if outcome.report.cancelled {
                return Ok(ExitCode::from(EXIT_CANCELLED));
            }
        }
        Commands::Probe { plain } => {
            let orchestrator = Orchestrator::from_config(config)?;
            probe::run_probe(&orchestrator, plain).await?;
        }
        Commands::Config => {
            print!("{}", toml::to_string_pretty(&config.redacted())?);
        }
    }
    Ok(ExitCode::SUCCESS)
}

/// Logs go to stderr so stdout carries only records. `RUST_LOG` overrides
/// the configured level.
fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("triage={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
