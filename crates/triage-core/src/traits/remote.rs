// SPDX-FileCopyrightText: 2026 Triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait for engines reached over a network API.

use std::time::Duration;

use async_trait::async_trait;

use crate::types::{EngineKind, EngineResult, NormalizedText};

/// A network-bound classifier that may be slow, rate-limited, or unreachable.
#[async_trait]
pub trait RemoteEngine: Send + Sync + 'static {
    /// Which engine this is.
    fn kind(&self) -> EngineKind;

    /// Classifies each text, returning one result per input in input order.
    ///
    /// Per-document failures are reported in the result's status; this
    /// method itself never fails.
    async fn classify_batch(&self, texts: &[NormalizedText], timeout: Duration)
    -> Vec<EngineResult>;

    /// Cheap liveness check. Any error counts as unavailable.
    async fn probe(&self) -> bool;

    /// Clears state that only lives for one run. Called at the start of
    /// every run, before availability is resolved.
    fn reset(&self) {}
}
