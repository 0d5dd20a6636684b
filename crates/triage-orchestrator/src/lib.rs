// SPDX-FileCopyrightText: 2026 Triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Multi-engine classification orchestrator.
//!
//! Data flow for one batch: normalize, run the rule engine and the
//! transformer on every document, run the LLM engines on the sampled
//! documents, merge per dimension by static priority, then repair
//! cross-dimension inconsistencies.
//!
//! ```no_run
//! # async fn demo(config: triage_config::TriageConfig, docs: Vec<triage_core::Document>) -> Result<(), triage_core::TriageError> {
//! use tokio_util::sync::CancellationToken;
//! use triage_orchestrator::Orchestrator;
//!
//! let orchestrator = Orchestrator::from_config(&config)?;
//! let run = orchestrator
//!     .run(docs, &config.execution_plan(), CancellationToken::new())
//!     .await;
//! for note in run.plan_notes() {
//!     eprintln!("{note}");
//! }
//! let report = run.collect().await?;
//! println!("{} records", report.records().count());
//! # Ok(())
//! # }
//! ```

pub mod consistency;
pub mod merge;
pub mod orchestrator;
pub mod probe;
pub mod report;
pub mod resolve;
pub mod sampling;
pub mod scheduler;

pub use consistency::ConsistencyEnforcer;
pub use orchestrator::{ClassificationRun, Orchestrator, OrchestratorBuilder};
pub use probe::AvailabilityProbe;
pub use report::{ClassifiedBatch, EngineCounts, EngineStats, RunReport, RunStatistics};
pub use resolve::{DropReason, PlanNote};
pub use scheduler::{BatchJob, BatchScheduler, Progress};
