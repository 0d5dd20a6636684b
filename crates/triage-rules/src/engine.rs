// SPDX-FileCopyrightText: 2026 Triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The rule engine.

use tracing::trace;
use triage_config::model::RulesConfig;
use triage_core::{
    EngineKind, EngineResult, Label, LocalEngine, NormalizedText, Urgency,
};

use crate::fallback::{detect_incident, detect_topic, responsible_for};
use crate::tables::{CLAIM, RESOLUTION, Score, URGENCY_CRITICAL, URGENCY_HIGH, URGENCY_MEDIUM};

/// Confidence grows from this base by one step per matching pattern, so a
/// single match scores 0.7.
const BASE_CONFIDENCE: f32 = 0.6;
const CONFIDENCE_STEP: f32 = 0.1;
const MAX_CONFIDENCE: f32 = 0.9;

/// Weighted keyword scorer for complaint flag and urgency.
#[derive(Debug, Clone)]
pub struct RuleEngine {
    confidence_floor: f32,
    fallback_confidence_scale: f32,
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::new(&RulesConfig::default())
    }
}

impl RuleEngine {
    pub fn new(config: &RulesConfig) -> Self {
        Self {
            confidence_floor: config.confidence_floor.min(BASE_CONFIDENCE),
            fallback_confidence_scale: config.fallback_confidence_scale,
        }
    }

    fn confidence(&self, hits: u32) -> f32 {
        if hits == 0 {
            self.confidence_floor
        } else {
            (BASE_CONFIDENCE + CONFIDENCE_STEP * hits as f32).min(MAX_CONFIDENCE)
        }
    }

    /// Claim when complaint evidence is at least as heavy as resolution
    /// evidence. Equal non-zero weights resolve to a claim.
    fn claim(folded: &str) -> (bool, u32) {
        let claim = CLAIM.score(folded);
        let resolution = RESOLUTION.score(folded);
        let is_claim = !claim.is_zero() && claim.weight >= resolution.weight;
        (is_claim, claim.hits + resolution.hits)
    }

    /// Heaviest urgency level wins; equal weights keep the more severe
    /// level. A claim with no urgency signal is at least medium.
    fn urgency(folded: &str, is_claim: bool) -> (Urgency, u32) {
        let levels = [
            (Urgency::Critical, URGENCY_CRITICAL.score(folded)),
            (Urgency::High, URGENCY_HIGH.score(folded)),
            (Urgency::Medium, URGENCY_MEDIUM.score(folded)),
        ];
        let hits = levels.iter().map(|(_, s)| s.hits).sum();
        let mut best = (Urgency::LOWEST, Score::default());
        for (level, score) in levels {
            if score.weight > best.1.weight {
                best = (level, score);
            }
        }
        let urgency = if is_claim && best.0 == Urgency::LOWEST {
            Urgency::Medium
        } else {
            best.0
        };
        (urgency, hits)
    }
}

impl LocalEngine for RuleEngine {
    fn kind(&self) -> EngineKind {
        EngineKind::Rule
    }

    fn classify(&self, text: &NormalizedText) -> EngineResult {
        let folded = triage_text::fold(&text.clean_text).replace('\u{2019}', "'");

        let (is_claim, claim_hits) = Self::claim(&folded);
        let (urgency, urgency_hits) = Self::urgency(&folded, is_claim);
        let (topic, topic_score) = detect_topic(&folded);
        let (incident, incident_score) = detect_incident(&folded, is_claim);
        let responsible = responsible_for(incident, topic);

        trace!(
            is_claim,
            %urgency,
            %topic,
            %incident,
            "rule engine verdict"
        );

        let scale = self.fallback_confidence_scale;
        EngineResult::ok(EngineKind::Rule)
            .with(Label::Claim(is_claim), self.confidence(claim_hits))
            .with(Label::Urgency(urgency), self.confidence(urgency_hits))
            .with(
                Label::Topic(topic),
                self.confidence(topic_score.hits) * scale,
            )
            .with(
                Label::Incident(incident),
                self.confidence(incident_score.hits) * scale,
            )
            .with(
                Label::Responsible(responsible),
                self.confidence(incident_score.hits) * scale,
            )
    }
}
