// SPDX-FileCopyrightText: 2026 Triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait for in-process, always-available engines.

use crate::types::{EngineKind, EngineResult, NormalizedText};

/// A synchronous, CPU-bound classifier.
///
/// Implementations must always return a result with status OK. Internal
/// errors degrade to a low-confidence default label instead of surfacing.
pub trait LocalEngine: Send + Sync + 'static {
    /// Which engine this is.
    fn kind(&self) -> EngineKind;

    /// Classifies one normalized text.
    fn classify(&self, text: &NormalizedText) -> EngineResult;
}
