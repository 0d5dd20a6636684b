// SPDX-FileCopyrightText: 2026 Triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fixed-size batching with progress and ETA tracking.
//!
//! [`BatchScheduler::batches`] hands out input batches lazily. The
//! orchestrator reports each completed batch back through
//! [`BatchScheduler::record_completed`]; the ETA is the number of remaining
//! batches times the mean duration of the last `eta_window` batches.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use triage_core::Document;

/// Default number of documents per batch.
pub const DEFAULT_BATCH_SIZE: usize = 50;

/// Default number of recent batch durations averaged for the ETA.
pub const DEFAULT_ETA_WINDOW: usize = 5;

/// Read-only snapshot of scheduler state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchJob {
    pub total_documents: usize,
    pub processed_count: usize,
    pub batches_completed: usize,
    pub started_at: DateTime<Utc>,
    pub estimated_completion: Option<DateTime<Utc>>,
}

/// Progress as reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub processed: usize,
    pub total: usize,
    /// `None` until the first batch completes.
    pub eta: Option<Duration>,
}

/// One slice of the input.
#[derive(Debug, Clone)]
pub struct Batch {
    pub index: usize,
    /// Position of the first document in the whole input.
    pub offset: usize,
    pub documents: Vec<Document>,
}

#[derive(Debug)]
struct State {
    processed: usize,
    batches_completed: usize,
    started_at: DateTime<Utc>,
    durations: VecDeque<Duration>,
}

impl State {
    fn fresh() -> Self {
        Self {
            processed: 0,
            batches_completed: 0,
            started_at: Utc::now(),
            durations: VecDeque::new(),
        }
    }
}

/// Splits a document set into batches and tracks their completion.
///
/// Clones share progress state.
#[derive(Debug, Clone)]
pub struct BatchScheduler {
    documents: Arc<[Document]>,
    batch_size: usize,
    eta_window: usize,
    state: Arc<Mutex<State>>,
}

impl BatchScheduler {
    pub fn new(documents: Vec<Document>, batch_size: usize) -> Self {
        Self {
            documents: documents.into(),
            batch_size: batch_size.max(1),
            eta_window: DEFAULT_ETA_WINDOW,
            state: Arc::new(Mutex::new(State::fresh())),
        }
    }

    pub fn with_eta_window(mut self, window: usize) -> Self {
        self.eta_window = window.max(1);
        self
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn total_documents(&self) -> usize {
        self.documents.len()
    }

    pub fn batch_count(&self) -> usize {
        self.documents.len().div_ceil(self.batch_size)
    }

    /// Lazily yields batches from the first one, resetting progress.
    ///
    /// Calling it again restarts from the beginning; there is no resume.
    pub fn batches(&self) -> Batches {
        *self.state() = State::fresh();
        Batches {
            documents: Arc::clone(&self.documents),
            batch_size: self.batch_size,
            next: 0,
        }
    }

    /// Records that a batch of `documents` finished in `duration`.
    pub fn record_completed(&self, documents: usize, duration: Duration) {
        let mut state = self.state();
        state.processed = (state.processed + documents).min(self.documents.len());
        state.batches_completed += 1;
        state.durations.push_back(duration);
        while state.durations.len() > self.eta_window {
            state.durations.pop_front();
        }
    }

    pub fn progress(&self) -> Progress {
        let state = self.state();
        Progress {
            processed: state.processed,
            total: self.documents.len(),
            eta: self.eta(&state),
        }
    }

    pub fn job(&self) -> BatchJob {
        let state = self.state();
        let eta = self.eta(&state);
        BatchJob {
            total_documents: self.documents.len(),
            processed_count: state.processed,
            batches_completed: state.batches_completed,
            started_at: state.started_at,
            estimated_completion: eta
                .and_then(|eta| chrono::Duration::from_std(eta).ok())
                .map(|eta| Utc::now() + eta),
        }
    }

    fn eta(&self, state: &State) -> Option<Duration> {
        if state.durations.is_empty() {
            return None;
        }
        let total: Duration = state.durations.iter().sum();
        let mean = total / state.durations.len() as u32;
        let remaining = self.batch_count().saturating_sub(state.batches_completed);
        Some(mean * remaining as u32)
    }
}

/// Iterator over the batches of a [`BatchScheduler`].
#[derive(Debug)]
pub struct Batches {
    documents: Arc<[Document]>,
    batch_size: usize,
    next: usize,
}

impl Iterator for Batches {
    type Item = Batch;

    fn next(&mut self) -> Option<Batch> {
        let offset = self.next * self.batch_size;
        if offset >= self.documents.len() {
            return None;
        }
        let end = (offset + self.batch_size).min(self.documents.len());
        let batch = Batch {
            index: self.next,
            offset,
            documents: self.documents[offset..end].to_vec(),
        };
        self.next += 1;
        Some(batch)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self
            .documents
            .len()
            .div_ceil(self.batch_size)
            .saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Batches {}

#[cfg(test)]
mod tests {
    use super::*;

    fn docs(n: usize) -> Vec<Document> {
        (0..n).map(|i| Document::new(i.to_string(), format!("text {i}"))).collect()
    }

    #[test]
    fn splits_into_fixed_size_batches() {
        let scheduler = BatchScheduler::new(docs(120), 50);
        let sizes: Vec<usize> = scheduler.batches().map(|b| b.documents.len()).collect();
        assert_eq!(sizes, vec![50, 50, 20]);
        assert_eq!(scheduler.batch_count(), 3);

        let offsets: Vec<usize> = scheduler.batches().map(|b| b.offset).collect();
        assert_eq!(offsets, vec![0, 50, 100]);
    }

    #[test]
    fn empty_input_has_no_batches() {
        let scheduler = BatchScheduler::new(Vec::new(), 50);
        assert_eq!(scheduler.batches().count(), 0);
        assert_eq!(scheduler.progress().total, 0);
    }

    #[test]
    fn eta_uses_moving_average() {
        let scheduler = BatchScheduler::new(docs(500), 50).with_eta_window(2);
        let _ = scheduler.batches();
        assert_eq!(scheduler.progress().eta, None);

        scheduler.record_completed(50, Duration::from_secs(10));
        scheduler.record_completed(50, Duration::from_secs(2));
        scheduler.record_completed(50, Duration::from_secs(4));
        let progress = scheduler.progress();
        assert_eq!(progress.processed, 150);
        // Window of two: (2 + 4) / 2 = 3s per batch, 7 batches left.
        assert_eq!(progress.eta, Some(Duration::from_secs(21)));

        let job = scheduler.job();
        assert_eq!(job.batches_completed, 3);
        assert!(job.estimated_completion.is_some_and(|t| t > job.started_at));
    }

    #[test]
    fn batches_restart_from_the_beginning() {
        let scheduler = BatchScheduler::new(docs(100), 30);
        let mut first = scheduler.batches();
        first.next();
        scheduler.record_completed(30, Duration::from_secs(1));
        assert_eq!(scheduler.progress().processed, 30);

        let mut again = scheduler.batches();
        assert_eq!(again.len(), 4);
        assert_eq!(again.next().map(|b| b.index), Some(0));
        assert_eq!(scheduler.progress().processed, 0);
    }
}
