// SPDX-FileCopyrightText: 2026 Triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The multi-engine classification run.
//!
//! A run resolves the requested plan once, then streams batches. Inside a
//! batch the local engines run synchronously on every document and the LLM
//! engines run concurrently on the sampled documents, bounded by a
//! semaphore shared by the whole run. Up to `batches_in_flight` batches are
//! processed at once; the output stream keeps batch order.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures::stream::{self, BoxStream, FuturesUnordered, StreamExt};
use tokio::sync::Semaphore;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use triage_config::TriageConfig;
use triage_core::{
    Document, Engine, EngineFailure, EngineKind, EngineResult, ExecutionPlan, LocalEngine,
    NormalizedText, RemoteEngine, TriageError,
};
use triage_gemini::GeminiEngine;
use triage_ollama::OllamaEngine;
use triage_rules::RuleEngine;
use triage_sentiment::SentimentEngine;
use triage_text::TextNormalizer;

use crate::consistency::ConsistencyEnforcer;
use crate::merge::merge;
use crate::probe::{AvailabilityProbe, DEFAULT_PROBE_TIMEOUT};
use crate::report::{ClassifiedBatch, EngineStats, RunReport, tally};
use crate::resolve::{DropReason, PlanNote, resolve_plan};
use crate::sampling::select_sample;
use crate::scheduler::{Batch, BatchScheduler, DEFAULT_BATCH_SIZE, DEFAULT_ETA_WINDOW};

/// Default number of batches processed concurrently.
pub const DEFAULT_BATCHES_IN_FLIGHT: usize = 2;

/// Default probe cache lifetime.
pub const DEFAULT_PROBE_TTL: Duration = Duration::from_secs(30);

/// Registers engines and batching options.
pub struct OrchestratorBuilder {
    normalizer: TextNormalizer,
    engines: Vec<Engine>,
    batch_size: usize,
    batches_in_flight: usize,
    eta_window: usize,
    probe_ttl: Duration,
    probe_timeout: Duration,
}

impl Default for OrchestratorBuilder {
    fn default() -> Self {
        Self {
            normalizer: TextNormalizer::default(),
            engines: Vec::new(),
            batch_size: DEFAULT_BATCH_SIZE,
            batches_in_flight: DEFAULT_BATCHES_IN_FLIGHT,
            eta_window: DEFAULT_ETA_WINDOW,
            probe_ttl: DEFAULT_PROBE_TTL,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }
}

impl OrchestratorBuilder {
    pub fn normalizer(mut self, normalizer: TextNormalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    /// Registers an engine. A later registration of the same kind replaces
    /// the earlier one.
    pub fn engine(mut self, engine: Engine) -> Self {
        self.engines.retain(|e| e.kind() != engine.kind());
        self.engines.push(engine);
        self
    }

    pub fn local(self, engine: Arc<dyn LocalEngine>) -> Self {
        self.engine(Engine::Local(engine))
    }

    pub fn remote(self, engine: Arc<dyn RemoteEngine>) -> Self {
        self.engine(Engine::Remote(engine))
    }

    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn batches_in_flight(mut self, batches: usize) -> Self {
        self.batches_in_flight = batches.max(1);
        self
    }

    pub fn eta_window(mut self, window: usize) -> Self {
        self.eta_window = window.max(1);
        self
    }

    pub fn probe_ttl(mut self, ttl: Duration) -> Self {
        self.probe_ttl = ttl;
        self
    }

    /// Outer bound on one availability check, across every remote engine.
    pub fn probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    /// Fails unless both the rule engine and the transformer are registered
    /// as local engines.
    pub fn build(self) -> Result<Orchestrator, TriageError> {
        let mut rule = None;
        let mut transformer = None;
        let mut remotes = Vec::new();

        for engine in self.engines {
            match (engine.kind(), engine) {
                (EngineKind::Rule, Engine::Local(e)) => rule = Some(e),
                (EngineKind::Transformer, Engine::Local(e)) => transformer = Some(e),
                (kind, Engine::Remote(e)) if kind.is_llm() => remotes.push(e),
                (kind, other) => {
                    return Err(TriageError::Config(format!(
                        "engine {kind} registered with the wrong interface: {other:?}"
                    )));
                }
            }
        }

        let rule = rule.ok_or_else(|| TriageError::Config("no rule engine registered".into()))?;
        let transformer = transformer
            .ok_or_else(|| TriageError::Config("no transformer engine registered".into()))?;
        let remote_map: BTreeMap<EngineKind, Arc<dyn RemoteEngine>> =
            remotes.iter().map(|e| (e.kind(), Arc::clone(e))).collect();

        Ok(Orchestrator {
            normalizer: Arc::new(self.normalizer),
            rule,
            transformer,
            probe: Arc::new(
                AvailabilityProbe::new(self.probe_ttl, remotes)
                    .with_probe_timeout(self.probe_timeout),
            ),
            remotes: remote_map,
            batch_size: self.batch_size,
            batches_in_flight: self.batches_in_flight,
            eta_window: self.eta_window,
        })
    }
}

/// Runs classification over document sets.
pub struct Orchestrator {
    normalizer: Arc<TextNormalizer>,
    rule: Arc<dyn LocalEngine>,
    transformer: Arc<dyn LocalEngine>,
    remotes: BTreeMap<EngineKind, Arc<dyn RemoteEngine>>,
    probe: Arc<AvailabilityProbe>,
    batch_size: usize,
    batches_in_flight: usize,
    eta_window: usize,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("remotes", &self.remotes.keys().collect::<Vec<_>>())
            .field("batch_size", &self.batch_size)
            .field("batches_in_flight", &self.batches_in_flight)
            .finish()
    }
}

impl Orchestrator {
    pub fn builder() -> OrchestratorBuilder {
        OrchestratorBuilder::default()
    }

    /// Builds every engine the configuration describes.
    ///
    /// The cloud engine is only registered when an API key resolves. The
    /// outer probe bound is the larger of the two engines' probe timeouts so
    /// it never cuts a configured check short.
    pub fn from_config(config: &TriageConfig) -> Result<Self, TriageError> {
        let probe_timeout_secs = config
            .ollama
            .probe_timeout_secs
            .max(config.gemini.probe_timeout_secs);
        let mut builder = Self::builder()
            .normalizer(TextNormalizer::new(&config.normalizer))
            .local(Arc::new(RuleEngine::new(&config.rules)))
            .local(Arc::new(SentimentEngine::from_config(&config.sentiment)?))
            .remote(Arc::new(OllamaEngine::new(&config.ollama, &config.retry)?))
            .batch_size(config.orchestrator.batch_size)
            .batches_in_flight(config.orchestrator.batches_in_flight)
            .eta_window(config.orchestrator.eta_window)
            .probe_ttl(Duration::from_secs(config.probe.ttl_secs))
            .probe_timeout(Duration::from_secs(probe_timeout_secs));

        let gemini = GeminiEngine::new(&config.gemini, &config.retry)?;
        if gemini.is_configured() {
            builder = builder.remote(Arc::new(gemini));
        }
        builder.build()
    }

    pub fn probe(&self) -> &AvailabilityProbe {
        &self.probe
    }

    /// Starts a run. Plan resolution happens here; batches are processed
    /// as the returned run is polled.
    pub async fn run(
        &self,
        documents: Vec<Document>,
        requested: &ExecutionPlan,
        cancel: CancellationToken,
    ) -> ClassificationRun {
        for engine in self.remotes.values() {
            engine.reset();
        }
        let (plan, notes) = resolve_plan(requested, &self.probe).await;
        let scheduler =
            BatchScheduler::new(documents, self.batch_size).with_eta_window(self.eta_window);

        info!(
            documents = scheduler.total_documents(),
            batches = scheduler.batch_count(),
            engines = ?plan.engines(),
            sample_fraction = plan.sample_fraction(),
            "run started"
        );

        let context = Arc::new(RunContext {
            normalizer: Arc::clone(&self.normalizer),
            rule: Arc::clone(&self.rule),
            transformer: Arc::clone(&self.transformer),
            remotes: plan
                .llm_engines()
                .filter_map(|kind| self.remotes.get(&kind).cloned())
                .collect(),
            probe: Arc::clone(&self.probe),
            semaphore: Arc::new(Semaphore::new(plan.max_in_flight())),
            enforcer: ConsistencyEnforcer,
            plan: plan.clone(),
            scheduler: scheduler.clone(),
            cancel: cancel.clone(),
        });

        let batches = stream::iter(scheduler.batches())
            .map(move |batch| {
                let context = Arc::clone(&context);
                async move { context.process(batch).await }
            })
            .buffered(self.batches_in_flight)
            .scan(false, |stopped, item| {
                if *stopped {
                    return futures::future::ready(None);
                }
                *stopped = matches!(&item, Err(e) if !matches!(e, TriageError::Cancelled));
                futures::future::ready(Some(item))
            });

        // Batches still in flight when the token fires may finish before an
        // earlier one gives up, so cancelled batches are dropped from the
        // middle of the stream and reported once after the last completed one.
        let cancelled = Arc::new(AtomicBool::new(false));
        let seen = Arc::clone(&cancelled);
        let batches = batches
            .filter_map(move |item| {
                let kept = match item {
                    Err(TriageError::Cancelled) => {
                        seen.store(true, Ordering::Relaxed);
                        None
                    }
                    other => Some(other),
                };
                futures::future::ready(kept)
            })
            .chain(
                stream::once(async move { cancelled.load(Ordering::Relaxed) })
                    .filter_map(|cancelled| {
                        futures::future::ready(cancelled.then_some(Err(TriageError::Cancelled)))
                    }),
            )
            .boxed();

        ClassificationRun {
            plan,
            notes,
            scheduler,
            cancel,
            batches,
        }
    }
}

/// A run in progress.
pub struct ClassificationRun {
    plan: ExecutionPlan,
    notes: Vec<PlanNote>,
    scheduler: BatchScheduler,
    cancel: CancellationToken,
    batches: BoxStream<'static, Result<ClassifiedBatch, TriageError>>,
}

impl ClassificationRun {
    /// The plan after availability resolution.
    pub fn plan(&self) -> &ExecutionPlan {
        &self.plan
    }

    /// Engines dropped from the requested plan, and why.
    pub fn plan_notes(&self) -> &[PlanNote] {
        &self.notes
    }

    /// Shared handle for progress reporting; stays valid after `into_stream`.
    pub fn scheduler(&self) -> BatchScheduler {
        self.scheduler.clone()
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Completed batches in input order. The stream ends after the first
    /// error. On cancellation every batch that completed is still yielded,
    /// followed by a single [`TriageError::Cancelled`].
    pub fn into_stream(self) -> BoxStream<'static, Result<ClassifiedBatch, TriageError>> {
        self.batches
    }

    /// Drives the run to completion.
    ///
    /// Cancellation is not an error here: the report holds the batches that
    /// completed and `cancelled` is set. Any other error is returned.
    pub async fn collect(self) -> Result<RunReport, TriageError> {
        let mut report = RunReport {
            notes: self.notes,
            ..RunReport::default()
        };
        let mut batches = self.batches;
        while let Some(item) = batches.next().await {
            match item {
                Ok(batch) => report.batches.push(batch),
                Err(TriageError::Cancelled) => {
                    report.cancelled = true;
                    break;
                }
                Err(e) => return Err(e),
            }
        }
        let late_notes: Vec<PlanNote> = report
            .batches
            .iter()
            .flat_map(|b| b.notes.iter().cloned())
            .collect();
        for note in late_notes {
            if !report.notes.contains(&note) {
                report.notes.push(note);
            }
        }
        Ok(report)
    }
}

struct RunContext {
    normalizer: Arc<TextNormalizer>,
    rule: Arc<dyn LocalEngine>,
    transformer: Arc<dyn LocalEngine>,
    remotes: Vec<Arc<dyn RemoteEngine>>,
    probe: Arc<AvailabilityProbe>,
    semaphore: Arc<Semaphore>,
    enforcer: ConsistencyEnforcer,
    plan: ExecutionPlan,
    scheduler: BatchScheduler,
    cancel: CancellationToken,
}

impl RunContext {
    async fn process(&self, batch: Batch) -> Result<ClassifiedBatch, TriageError> {
        if self.cancel.is_cancelled() {
            return Err(TriageError::Cancelled);
        }
        let started = Instant::now();

        let normalized: Vec<NormalizedText> = batch
            .documents
            .iter()
            .map(|doc| {
                let text = self.normalizer.normalize(&doc.raw_text);
                if text.is_degraded() {
                    warn!(document_id = %doc.id, "normalization degraded, classifying with defaults");
                }
                text
            })
            .collect();

        let rule_results: Vec<EngineResult> =
            normalized.iter().map(|t| self.rule.classify(t)).collect();
        let transformer_results: Vec<EngineResult> =
            normalized.iter().map(|t| self.transformer.classify(t)).collect();

        let (llm_results, notes) = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                debug!(batch = batch.index, "batch abandoned on cancellation");
                return Err(TriageError::Cancelled);
            }
            outcome = self.run_llms(&normalized, &rule_results) => outcome,
        };

        let mut engine_stats = EngineStats::new();
        tally(&mut engine_stats, &rule_results);
        tally(&mut engine_stats, &transformer_results);

        let mut records = Vec::with_capacity(batch.documents.len());
        for (i, document) in batch.documents.iter().enumerate() {
            let mut results = vec![rule_results[i].clone(), transformer_results[i].clone()];
            for per_engine in &llm_results {
                results.push(per_engine[i].clone());
            }
            tally(&mut engine_stats, &results[2..]);
            let record = merge(document, &normalized[i], &results)?;
            records.push(self.enforcer.repair(record));
        }

        let duration = started.elapsed();
        self.scheduler.record_completed(records.len(), duration);
        debug!(
            batch = batch.index,
            documents = records.len(),
            elapsed_ms = duration.as_millis() as u64,
            "batch completed"
        );

        Ok(ClassifiedBatch {
            index: batch.index,
            records,
            engine_stats,
            duration,
            notes,
        })
    }

    /// Runs every available LLM engine on the sampled documents. Engines run
    /// concurrently with each other; all calls share the run's semaphore.
    ///
    /// Returns one result vector per engine, each in document order.
    async fn run_llms(
        &self,
        texts: &[NormalizedText],
        signals: &[EngineResult],
    ) -> (Vec<Vec<EngineResult>>, Vec<PlanNote>) {
        if self.remotes.is_empty() {
            return (Vec::new(), Vec::new());
        }

        let sample = select_sample(signals, self.plan.sample_fraction());
        let outcomes = futures::future::join_all(
            self.remotes
                .iter()
                .map(|engine| self.run_engine(engine, texts, &sample)),
        )
        .await;

        let mut per_engine = Vec::with_capacity(outcomes.len());
        let mut notes = Vec::new();
        for (results, note) in outcomes {
            per_engine.push(results);
            notes.extend(note);
        }
        (per_engine, notes)
    }

    async fn run_engine(
        &self,
        engine: &Arc<dyn RemoteEngine>,
        texts: &[NormalizedText],
        sample: &[bool],
    ) -> (Vec<EngineResult>, Option<PlanNote>) {
        let kind = engine.kind();
        if !self.probe.is_available(kind).await {
            let note = PlanNote {
                engine: kind,
                reason: DropReason::Unavailable,
            };
            return (vec![EngineResult::skipped(kind); texts.len()], Some(note));
        }

        let timeout = self.plan.timeout(kind);
        let mut slots: Vec<Option<EngineResult>> = vec![None; texts.len()];
        let mut calls: FuturesUnordered<_> = texts
            .iter()
            .enumerate()
            .filter(|(i, _)| sample[*i])
            .map(|(i, text)| {
                let engine = Arc::clone(engine);
                let semaphore = Arc::clone(&self.semaphore);
                async move { (i, call_engine(engine.as_ref(), &semaphore, text, timeout).await) }
            })
            .collect();

        while let Some((i, result)) = calls.next().await {
            slots[i] = Some(result);
        }

        let results: Vec<EngineResult> = slots
            .into_iter()
            .map(|slot| slot.unwrap_or_else(|| EngineResult::skipped(kind)))
            .collect();

        let refused = results
            .iter()
            .any(|r| matches!(r.failure, Some(EngineFailure::Unavailable(_))));
        if !refused {
            return (results, None);
        }
        self.probe.mark_unavailable(kind).await;
        let note = PlanNote {
            engine: kind,
            reason: DropReason::RefusedService,
        };
        (results, Some(note))
    }
}

/// One LLM call under the run-wide concurrency bound and its own timeout.
async fn call_engine(
    engine: &dyn RemoteEngine,
    semaphore: &Semaphore,
    text: &NormalizedText,
    timeout: Duration,
) -> EngineResult {
    let kind = engine.kind();
    let Ok(_permit) = semaphore.acquire().await else {
        return EngineResult::failed(kind, EngineFailure::CallFailed("run shut down".into()));
    };

    match tokio::time::timeout(timeout, engine.classify_batch(std::slice::from_ref(text), timeout)).await {
        Ok(results) => results.into_iter().next().unwrap_or_else(|| {
            EngineResult::failed(kind, EngineFailure::CallFailed("engine returned no result".into()))
        }),
        Err(_) => {
            warn!(engine = %kind, timeout_ms = timeout.as_millis() as u64, "LLM call timed out");
            EngineResult::failed(kind, EngineFailure::TimedOut(timeout))
        }
    }
}
