// SPDX-FileCopyrightText: 2026 Triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Structured-response parsing and taxonomy validation.
//!
//! Models wrap their JSON in prose or code fences often enough that the
//! parser first isolates the first balanced `{...}` block, then deserializes
//! it. Every label must belong to the fixed taxonomy: an unknown value is an
//! [`EngineFailure::InvalidLabel`], never coerced to a default.

use serde::Deserialize;
use serde_json::Value;
use triage_core::{Dimension, EngineFailure, EngineKind, EngineResult, Label};

/// Confidence assumed when the model omits one.
pub const DEFAULT_LLM_CONFIDENCE: f32 = 0.6;

/// Raw verdict as returned by a model, before validation.
///
/// Field aliases accept the French key names some prompts elicit.
#[derive(Debug, Clone, Deserialize)]
pub struct LlmVerdict {
    pub sentiment: Value,
    #[serde(alias = "reclamation", alias = "claim")]
    pub is_claim: Value,
    #[serde(alias = "urgence")]
    pub urgency: Value,
    #[serde(alias = "topics", alias = "theme")]
    pub topic: Value,
    #[serde(alias = "incident")]
    pub incident_type: Value,
    #[serde(alias = "responsable")]
    pub responsible: Value,
    #[serde(default, alias = "score_confiance")]
    pub confidence: Option<Value>,
}

impl LlmVerdict {
    /// Validates every label and builds the engine result.
    pub fn into_result(self, engine: EngineKind) -> Result<EngineResult, EngineFailure> {
        let confidence = parse_confidence(self.confidence.as_ref());
        let labels = [
            (Dimension::Sentiment, &self.sentiment),
            (Dimension::IsClaim, &self.is_claim),
            (Dimension::Urgency, &self.urgency),
            (Dimension::Topic, &self.topic),
            (Dimension::IncidentType, &self.incident_type),
            (Dimension::Responsible, &self.responsible),
        ];

        let mut result = EngineResult::ok(engine);
        for (dimension, value) in labels {
            result = result.with(parse_label(dimension, value)?, confidence);
        }
        Ok(result)
    }
}

/// Parses a raw model response into a validated [`EngineResult`].
pub fn parse_verdict(engine: EngineKind, raw: &str) -> Result<EngineResult, EngineFailure> {
    let json = extract_json_object(raw)
        .ok_or_else(|| EngineFailure::CallFailed("no JSON object in model response".into()))?;
    let verdict: LlmVerdict = serde_json::from_str(json)
        .map_err(|e| EngineFailure::CallFailed(format!("malformed model response: {e}")))?;
    verdict.into_result(engine)
}

/// Returns the first balanced `{...}` block in `raw`, honouring JSON string
/// escapes so braces inside strings do not count.
pub fn extract_json_object(raw: &str) -> Option<&str> {
    let mut search_from = 0;
    while let Some(offset) = raw[search_from..].find('{') {
        let start = search_from + offset;
        if let Some(end) = balanced_end(&raw[start..]) {
            return Some(&raw[start..start + end]);
        }
        search_from = start + 1;
    }
    None
}

fn balanced_end(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in s.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
    }
    None
}

fn parse_label(dimension: Dimension, value: &Value) -> Result<Label, EngineFailure> {
    let parsed = match value {
        Value::Bool(b) if dimension == Dimension::IsClaim => Some(Label::Claim(*b)),
        Value::String(s) => Label::parse_wire(dimension, s),
        _ => None,
    };
    parsed.ok_or_else(|| EngineFailure::InvalidLabel {
        dimension,
        value: match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        },
    })
}

fn parse_confidence(value: Option<&Value>) -> f32 {
    let raw = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match raw {
        Some(c) if c.is_finite() => c.clamp(0.0, 1.0) as f32,
        _ => DEFAULT_LLM_CONFIDENCE,
    }
}
