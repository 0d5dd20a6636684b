// SPDX-FileCopyrightText: 2026 Triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `triage classify`: read documents, run the orchestrator, stream records.
//!
//! Records are written as JSON lines in input order, one batch at a time,
//! so a cancelled run leaves every completed batch on disk.

use std::io::{BufWriter, IsTerminal, Write};
use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use futures::StreamExt;
use indicatif::{HumanDuration, ProgressBar, ProgressStyle};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use triage_config::TriageConfig;
use triage_core::{ClassificationRecord, ExecutionMode, LlmProvider, TriageError};
use triage_orchestrator::{BatchScheduler, Orchestrator, RunReport};

use crate::CliError;
use crate::input::{InputFormat, read_documents};
use crate::shutdown::install_signal_handler;

#[derive(Args, Debug)]
pub struct ClassifyArgs {
    /// CSV or JSON-lines file with one message per row.
    pub input: PathBuf,

    /// Input format; guessed from the file extension when omitted.
    #[arg(long, value_enum)]
    pub format: Option<InputFormat>,

    /// Column holding the message text.
    #[arg(long, default_value = "text")]
    pub text_column: String,

    /// Execution mode: fast, balanced or precise.
    #[arg(long)]
    pub mode: Option<ExecutionMode>,

    /// LLM provider: local, cloud or both.
    #[arg(long)]
    pub provider: Option<LlmProvider>,

    /// Fraction of documents sent to the LLM engines in balanced mode.
    #[arg(long)]
    pub sample: Option<f64>,

    /// Documents per batch.
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Upper bound on LLM calls in flight across the whole run.
    #[arg(long)]
    pub max_in_flight: Option<usize>,

    /// Write records here instead of stdout.
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Hide the progress bar and the closing summary.
    #[arg(long, short)]
    pub quiet: bool,
}

impl ClassifyArgs {
    /// Folds command-line overrides into the loaded configuration.
    pub fn apply(&self, config: &mut TriageConfig) {
        let o = &mut config.orchestrator;
        if let Some(mode) = self.mode {
            o.mode = mode;
        }
        if let Some(provider) = self.provider {
            o.provider = provider;
        }
        if let Some(sample) = self.sample {
            o.sample_fraction = sample;
        }
        if let Some(batch_size) = self.batch_size {
            o.batch_size = batch_size;
        }
        if let Some(max_in_flight) = self.max_in_flight {
            o.max_in_flight = max_in_flight;
        }
    }
}

/// What a finished (or cancelled) run hands back to `main`.
#[derive(Debug)]
pub struct ClassifyOutcome {
    pub report: RunReport,
    pub total_documents: usize,
}

pub async fn run_classify(
    config: &TriageConfig,
    args: &ClassifyArgs,
) -> Result<ClassifyOutcome, CliError> {
    let format = args
        .format
        .unwrap_or_else(|| InputFormat::from_path(&args.input));
    let documents = read_documents(&args.input, format, &args.text_column)?;
    info!(
        path = %args.input.display(),
        documents = documents.len(),
        ?format,
        "input loaded"
    );

    let orchestrator = Orchestrator::from_config(config)?;
    let cancel = CancellationToken::new();
    install_signal_handler(cancel.clone());

    let run = orchestrator
        .run(documents, &config.execution_plan(), cancel.clone())
        .await;
    for note in run.plan_notes() {
        warn!(engine = %note.engine, reason = %note.reason, "engine dropped from plan");
    }

    let scheduler = run.scheduler();
    let progress = progress_bar(scheduler.total_documents() as u64, args.quiet);
    let mut out = open_output(args.output.as_ref())?;
    let mut report = RunReport {
        notes: run.plan_notes().to_vec(),
        ..RunReport::default()
    };

    let mut batches = run.into_stream();
    while let Some(item) = batches.next().await {
        match item {
            Ok(batch) => {
                write_records(&mut out, &batch.records)?;
                out.flush()?;
                update_progress(&progress, &scheduler);
                for note in &batch.notes {
                    if !report.notes.contains(note) {
                        warn!(engine = %note.engine, reason = %note.reason, "engine dropped mid-run");
                        report.notes.push(note.clone());
                    }
                }
                report.batches.push(batch);
            }
            Err(TriageError::Cancelled) => {
                report.cancelled = true;
                break;
            }
            Err(e) => {
                progress.abandon();
                return Err(e.into());
            }
        }
    }
    cancel.cancel();

    if report.cancelled {
        progress.abandon_with_message("cancelled");
    } else {
        progress.finish_with_message("done");
    }
    Ok(ClassifyOutcome {
        report,
        total_documents: scheduler.total_documents(),
    })
}

fn open_output(path: Option<&PathBuf>) -> Result<BufWriter<Box<dyn Write>>, CliError> {
    let sink: Box<dyn Write> = match path {
        Some(path) => Box::new(std::fs::File::create(path)?),
        None => Box::new(std::io::stdout()),
    };
    Ok(BufWriter::new(sink))
}

pub fn write_records<W: Write>(out: &mut W, records: &[ClassificationRecord]) -> Result<(), CliError> {
    for record in records {
        serde_json::to_writer(&mut *out, record).map_err(CliError::Json)?;
        out.write_all(b"\n")?;
    }
    Ok(())
}

fn progress_bar(total: u64, quiet: bool) -> ProgressBar {
    if quiet || !std::io::stderr().is_terminal() {
        return ProgressBar::hidden();
    }
    let style = ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar())
    .progress_chars("=> ");
    let bar = ProgressBar::new(total).with_style(style);
    bar.enable_steady_tick(Duration::from_millis(120));
    bar
}

fn update_progress(bar: &ProgressBar, scheduler: &BatchScheduler) {
    let progress = scheduler.progress();
    bar.set_position(progress.processed as u64);
    if let Some(eta) = progress.eta {
        bar.set_message(format!("eta {}", HumanDuration(eta)));
    }
}

/// Prints totals, label distribution and per-engine outcomes to stderr.
pub fn print_summary(report: &RunReport, total_documents: usize) {
    use colored::Colorize;

    if !std::io::stderr().is_terminal() {
        colored::control::set_override(false);
    }
    let stats = report.statistics();
    eprintln!();
    eprintln!(
        "  {} {} of {} documents",
        "classified".bold(),
        stats.total,
        total_documents
    );
    eprintln!(
        "  claims {} ({:.1}%), mean confidence {:.2}, {} repaired",
        stats.claims,
        stats.claim_rate() * 100.0,
        stats.mean_confidence,
        stats.adjusted
    );
    eprintln!("  urgency  {}", format_counts(&stats.urgency));
    eprintln!("  topic    {}", format_counts(&stats.topic));

    for (engine, counts) in report.engine_stats() {
        eprintln!(
            "  {:<18} ok {:>6}  failed {:>4}  timed out {:>4}  skipped {:>6}",
            engine.to_string(),
            counts.ok,
            counts.failed,
            counts.timed_out,
            counts.skipped
        );
    }
    for note in &report.notes {
        eprintln!("  {} {note}", "note:".yellow());
    }
    if report.cancelled {
        eprintln!("  {}", "run cancelled; completed batches were written".yellow());
    }
    eprintln!();
}

fn format_counts(counts: &std::collections::BTreeMap<String, usize>) -> String {
    counts
        .iter()
        .map(|(label, n)| format!("{label}={n}"))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        args: ClassifyArgs,
    }

    #[test]
    fn overrides_replace_configured_values() {
        let harness = Harness::parse_from([
            "triage",
            "tweets.csv",
            "--mode",
            "precise",
            "--provider",
            "both",
            "--batch-size",
            "10",
        ]);
        let mut config = TriageConfig::default();
        let sample_before = config.orchestrator.sample_fraction;
        harness.args.apply(&mut config);

        assert_eq!(config.orchestrator.mode, ExecutionMode::Precise);
        assert_eq!(config.orchestrator.provider, LlmProvider::Both);
        assert_eq!(config.orchestrator.batch_size, 10);
        assert_eq!(config.orchestrator.sample_fraction, sample_before);
    }

    #[test]
    fn unknown_mode_is_rejected() {
        let parsed = Harness::try_parse_from(["triage", "in.csv", "--mode", "turbo"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn records_are_written_one_per_line() {
        use triage_core::{IncidentType, Responsible, Sentiment, Topic, Urgency};

        let record = ClassificationRecord {
            document_id: "1".into(),
            sentiment: Sentiment::Negative,
            is_claim: true,
            urgency: Urgency::High,
            topic: Topic::Fiber,
            incident_type: IncidentType::ConnectionOutage,
            responsible: Responsible::Technical,
            confidence: 0.8,
            engine_provenance: Default::default(),
            consistency_adjustments: Vec::new(),
            quality_score: 90,
            passthrough: Default::default(),
        };
        let mut buf = Vec::new();
        write_records(&mut buf, &[record.clone(), record]).unwrap();

        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        let value: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(value["document_id"], "1");
        assert_eq!(value["is_claim"], true);
    }

    #[test]
    fn counts_render_as_key_value_pairs() {
        let counts = [("high".to_string(), 2), ("low".to_string(), 5)]
            .into_iter()
            .collect();
        assert_eq!(format_counts(&counts), "high=2 low=5");
    }
}
