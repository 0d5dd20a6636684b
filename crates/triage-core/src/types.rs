// SPDX-FileCopyrightText: 2026 Triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by engines, the orchestrator, and callers.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::error::EngineFailure;
use crate::taxonomy::{IncidentType, Label, Responsible, Sentiment, Topic, Urgency};

/// One of the seven independent classification axes.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumString,
    EnumIter,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Sentiment,
    IsClaim,
    Urgency,
    Topic,
    IncidentType,
    Responsible,
    Confidence,
}

impl Dimension {
    pub const ALL: [Dimension; 7] = [
        Dimension::Sentiment,
        Dimension::IsClaim,
        Dimension::Urgency,
        Dimension::Topic,
        Dimension::IncidentType,
        Dimension::Responsible,
        Dimension::Confidence,
    ];

    /// Dimensions that carry a categorical label (everything but confidence).
    pub const LABELED: [Dimension; 6] = [
        Dimension::Sentiment,
        Dimension::IsClaim,
        Dimension::Urgency,
        Dimension::Topic,
        Dimension::IncidentType,
        Dimension::Responsible,
    ];
}

/// Identifies one of the four classification engines.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
pub enum EngineKind {
    #[strum(serialize = "rule_engine")]
    #[serde(rename = "rule_engine")]
    Rule,
    #[strum(serialize = "local_transformer")]
    #[serde(rename = "local_transformer")]
    Transformer,
    #[strum(serialize = "local_llm")]
    #[serde(rename = "local_llm")]
    LocalLlm,
    #[strum(serialize = "cloud_llm")]
    #[serde(rename = "cloud_llm")]
    CloudLlm,
}

impl EngineKind {
    pub const ALL: [EngineKind; 4] = [
        EngineKind::Rule,
        EngineKind::Transformer,
        EngineKind::LocalLlm,
        EngineKind::CloudLlm,
    ];

    /// Whether this engine reaches a language model over the network.
    pub fn is_llm(self) -> bool {
        matches!(self, EngineKind::LocalLlm | EngineKind::CloudLlm)
    }
}

/// Immutable input unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub raw_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    /// Columns supplied by the caller that are carried to the output untouched.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub passthrough: BTreeMap<String, String>,
}

impl Document {
    pub fn new(id: impl Into<String>, raw_text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            raw_text: raw_text.into(),
            timestamp: None,
            passthrough: BTreeMap::new(),
        }
    }
}

/// Cleaned text derived from a [`Document`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedText {
    pub clean_text: String,
    /// Text quality from 0 (unusable) to 100.
    pub quality_score: u8,
}

impl NormalizedText {
    /// The value produced for empty or malformed input.
    pub fn degraded() -> Self {
        Self {
            clean_text: String::new(),
            quality_score: 0,
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.quality_score == 0
    }
}

/// Outcome status of one engine on one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EngineStatus {
    Ok,
    Failed,
    Skipped,
    TimedOut,
}

/// Output of a single engine for a single document.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineResult {
    pub engine: EngineKind,
    pub dimension_values: BTreeMap<Dimension, Label>,
    pub per_dimension_confidence: BTreeMap<Dimension, f32>,
    pub status: EngineStatus,
    pub failure: Option<EngineFailure>,
}

impl EngineResult {
    /// An empty successful result; add labels with [`EngineResult::with`].
    pub fn ok(engine: EngineKind) -> Self {
        Self {
            engine,
            dimension_values: BTreeMap::new(),
            per_dimension_confidence: BTreeMap::new(),
            status: EngineStatus::Ok,
            failure: None,
        }
    }

    /// Adds a label with its confidence, clamped to `[0, 1]`.
    pub fn with(mut self, label: Label, confidence: f32) -> Self {
        let dimension = label.dimension();
        let confidence = if confidence.is_nan() {
            0.0
        } else {
            confidence.clamp(0.0, 1.0)
        };
        self.dimension_values.insert(dimension, label);
        self.per_dimension_confidence.insert(dimension, confidence);
        self
    }

    pub fn failed(engine: EngineKind, failure: EngineFailure) -> Self {
        Self {
            engine,
            dimension_values: BTreeMap::new(),
            per_dimension_confidence: BTreeMap::new(),
            status: failure.status(),
            failure: Some(failure),
        }
    }

    /// Result for a document that the engine was not asked to classify.
    pub fn skipped(engine: EngineKind) -> Self {
        Self {
            engine,
            dimension_values: BTreeMap::new(),
            per_dimension_confidence: BTreeMap::new(),
            status: EngineStatus::Skipped,
            failure: None,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == EngineStatus::Ok
    }

    pub fn label(&self, dimension: Dimension) -> Option<Label> {
        self.dimension_values.get(&dimension).copied()
    }

    pub fn confidence(&self, dimension: Dimension) -> Option<f32> {
        self.per_dimension_confidence.get(&dimension).copied()
    }
}

/// Final merged classification of one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationRecord {
    pub document_id: String,
    pub sentiment: Sentiment,
    pub is_claim: bool,
    pub urgency: Urgency,
    pub topic: Topic,
    pub incident_type: IncidentType,
    pub responsible: Responsible,
    pub confidence: f32,
    /// Which engine's value won, per dimension.
    pub engine_provenance: BTreeMap<Dimension, EngineKind>,
    /// Repairs applied by the consistency pass, in application order.
    #[serde(default)]
    pub consistency_adjustments: Vec<String>,
    pub quality_score: u8,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub passthrough: BTreeMap<String, String>,
}

impl ClassificationRecord {
    /// Returns the label currently held for a labelled dimension.
    pub fn label(&self, dimension: Dimension) -> Option<Label> {
        match dimension {
            Dimension::Sentiment => Some(Label::Sentiment(self.sentiment)),
            Dimension::IsClaim => Some(Label::Claim(self.is_claim)),
            Dimension::Urgency => Some(Label::Urgency(self.urgency)),
            Dimension::Topic => Some(Label::Topic(self.topic)),
            Dimension::IncidentType => Some(Label::Incident(self.incident_type)),
            Dimension::Responsible => Some(Label::Responsible(self.responsible)),
            Dimension::Confidence => None,
        }
    }
}
