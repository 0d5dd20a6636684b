// SPDX-FileCopyrightText: 2026 Triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Batch output and run summaries.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Serialize;
use triage_core::{ClassificationRecord, EngineKind, EngineResult, EngineStatus};

use crate::resolve::PlanNote;

/// Outcome counts of one engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EngineCounts {
    pub ok: usize,
    pub failed: usize,
    pub timed_out: usize,
    pub skipped: usize,
}

impl EngineCounts {
    pub fn record(&mut self, status: EngineStatus) {
        match status {
            EngineStatus::Ok => self.ok += 1,
            EngineStatus::Failed => self.failed += 1,
            EngineStatus::TimedOut => self.timed_out += 1,
            EngineStatus::Skipped => self.skipped += 1,
        }
    }

    pub fn add(&mut self, other: &EngineCounts) {
        self.ok += other.ok;
        self.failed += other.failed;
        self.timed_out += other.timed_out;
        self.skipped += other.skipped;
    }
}

/// Per-engine outcome counts.
pub type EngineStats = BTreeMap<EngineKind, EngineCounts>;

pub(crate) fn tally(stats: &mut EngineStats, results: &[EngineResult]) {
    for result in results {
        stats.entry(result.engine).or_default().record(result.status);
    }
}

/// A completed batch, records in input order.
#[derive(Debug, Clone)]
pub struct ClassifiedBatch {
    pub index: usize,
    pub records: Vec<ClassificationRecord>,
    pub engine_stats: EngineStats,
    pub duration: Duration,
    /// Engines that dropped out while this batch ran.
    pub notes: Vec<PlanNote>,
}

/// Everything a run produced.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub batches: Vec<ClassifiedBatch>,
    pub notes: Vec<PlanNote>,
    /// Set when the run stopped early; `batches` holds what completed.
    pub cancelled: bool,
}

impl RunReport {
    pub fn records(&self) -> impl Iterator<Item = &ClassificationRecord> {
        self.batches.iter().flat_map(|b| b.records.iter())
    }

    pub fn into_records(self) -> Vec<ClassificationRecord> {
        self.batches.into_iter().flat_map(|b| b.records).collect()
    }

    pub fn engine_stats(&self) -> EngineStats {
        let mut stats = EngineStats::new();
        for batch in &self.batches {
            for (engine, counts) in &batch.engine_stats {
                stats.entry(*engine).or_default().add(counts);
            }
        }
        stats
    }

    pub fn statistics(&self) -> RunStatistics {
        RunStatistics::from_records(self.records())
    }
}

/// Distribution summary of a set of records.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunStatistics {
    pub total: usize,
    pub claims: usize,
    pub adjusted: usize,
    pub mean_confidence: f32,
    pub sentiment: BTreeMap<String, usize>,
    pub urgency: BTreeMap<String, usize>,
    pub topic: BTreeMap<String, usize>,
    pub incident_type: BTreeMap<String, usize>,
    pub responsible: BTreeMap<String, usize>,
}

impl RunStatistics {
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a ClassificationRecord>) -> Self {
        let mut stats = RunStatistics::default();
        let mut confidence_sum = 0.0f64;

        for record in records {
            stats.total += 1;
            if record.is_claim {
                stats.claims += 1;
            }
            if !record.consistency_adjustments.is_empty() {
                stats.adjusted += 1;
            }
            confidence_sum += f64::from(record.confidence);
            *stats.sentiment.entry(record.sentiment.to_string()).or_default() += 1;
            *stats.urgency.entry(record.urgency.to_string()).or_default() += 1;
            *stats.topic.entry(record.topic.to_string()).or_default() += 1;
            *stats.incident_type.entry(record.incident_type.to_string()).or_default() += 1;
            *stats.responsible.entry(record.responsible.to_string()).or_default() += 1;
        }

        if stats.total > 0 {
            stats.mean_confidence = (confidence_sum / stats.total as f64) as f32;
        }
        stats
    }

    pub fn claim_rate(&self) -> f32 {
        if self.total == 0 {
            0.0
        } else {
            self.claims as f32 / self.total as f32
        }
    }
}
