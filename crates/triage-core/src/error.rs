// SPDX-FileCopyrightText: 2026 Triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the triage classifier.
//!
//! Two layers exist. [`TriageError`] is returned across crate boundaries and
//! is fatal for the operation that produced it. [`EngineFailure`] is the
//! contained, per-document outcome of a single engine call; it travels inside
//! an [`EngineResult`](crate::types::EngineResult) and never aborts a batch.

use std::time::Duration;

use thiserror::Error;

use crate::types::{Dimension, EngineKind, EngineStatus};

/// The primary error type used across all triage crates.
#[derive(Debug, Error)]
pub enum TriageError {
    /// Configuration errors (invalid TOML, out-of-range values, missing model files).
    #[error("configuration error: {0}")]
    Config(String),

    /// Remote engine errors (HTTP failure, unexpected response shape).
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// An engine could not be reached or refused service.
    #[error("engine {engine} unavailable: {reason}")]
    EngineUnavailable { engine: EngineKind, reason: String },

    /// Neither the rule engine nor the transformer produced a usable label.
    #[error("no usable engine produced a label for document {document_id}")]
    NoUsableEngine { document_id: String },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: Duration },

    /// The run was cancelled by the caller.
    #[error("classification run cancelled")]
    Cancelled,

    /// I/O errors from reading input or writing output.
    #[error("i/o error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

/// A contained failure of one engine on one document.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineFailure {
    /// Quota or authentication refusal; the engine is disabled for the rest of the run.
    #[error("engine unavailable: {0}")]
    Unavailable(String),

    /// Transient network error after retries, or a malformed response.
    #[error("engine call failed: {0}")]
    CallFailed(String),

    /// The call exceeded its per-call timeout.
    #[error("engine call timed out after {0:?}")]
    TimedOut(Duration),

    /// The engine returned a label outside the fixed taxonomy.
    #[error("invalid label {value:?} for dimension {dimension}")]
    InvalidLabel { dimension: Dimension, value: String },
}

impl EngineFailure {
    /// The [`EngineStatus`] reported for a result carrying this failure.
    pub fn status(&self) -> EngineStatus {
        match self {
            EngineFailure::TimedOut(_) => EngineStatus::TimedOut,
            EngineFailure::Unavailable(_)
            | EngineFailure::CallFailed(_)
            | EngineFailure::InvalidLabel { .. } => EngineStatus::Failed,
        }
    }
}
