// SPDX-FileCopyrightText: 2026 Triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the triage feedback classifier.
//!
//! This crate provides the domain model shared by every engine and by the
//! orchestrator: the fixed label taxonomy, the per-engine and merged result
//! types, the execution plan value object, the error taxonomy, and the
//! engine capability traits.

pub mod error;
pub mod plan;
pub mod taxonomy;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::{EngineFailure, TriageError};
pub use plan::{ExecutionMode, ExecutionPlan, LlmProvider};
pub use taxonomy::{IncidentType, Label, Responsible, Sentiment, Topic, Urgency};
pub use traits::{Engine, LocalEngine, RemoteEngine};
pub use types::{
    ClassificationRecord, Dimension, Document, EngineKind, EngineResult, EngineStatus,
    NormalizedText,
};
