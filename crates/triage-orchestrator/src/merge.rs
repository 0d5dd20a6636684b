// SPDX-FileCopyrightText: 2026 Triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-dimension merge of engine results into one record.
//!
//! Priority is a static table: for each dimension, an ordered list of tiers,
//! each tier an ordered list of engines. The first tier holding a successful
//! result with a label for the dimension wins; inside a tier the higher
//! per-dimension confidence wins and equal confidences keep table order.

use std::collections::BTreeMap;

use triage_core::{
    ClassificationRecord, Dimension, Document, EngineKind, EngineResult, IncidentType, Label,
    NormalizedText, Responsible, Sentiment, Topic, TriageError, Urgency,
};

const LLM_TIER: &[EngineKind] = &[EngineKind::LocalLlm, EngineKind::CloudLlm];

/// Merge priority per labelled dimension.
pub const PRIORITY: [(Dimension, &[&[EngineKind]]); 6] = [
    (Dimension::Sentiment, &[LLM_TIER, &[EngineKind::Transformer]]),
    (Dimension::IsClaim, &[LLM_TIER, &[EngineKind::Rule]]),
    (Dimension::Urgency, &[LLM_TIER, &[EngineKind::Rule]]),
    (Dimension::Topic, &[LLM_TIER, &[EngineKind::Rule]]),
    (Dimension::IncidentType, &[LLM_TIER, &[EngineKind::Rule]]),
    (Dimension::Responsible, &[LLM_TIER, &[EngineKind::Rule]]),
];

/// The winning label of one dimension.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Winner {
    engine: EngineKind,
    label: Label,
    confidence: f32,
}

fn pick(dimension: Dimension, tiers: &[&[EngineKind]], results: &[EngineResult]) -> Option<Winner> {
    for tier in tiers {
        let mut best: Option<Winner> = None;
        for &engine in tier.iter() {
            let candidate = results
                .iter()
                .filter(|r| r.engine == engine && r.is_ok())
                .find_map(|r| {
                    Some(Winner {
                        engine,
                        label: r.label(dimension)?,
                        confidence: r.confidence(dimension).unwrap_or(0.0),
                    })
                });
            if let Some(candidate) = candidate {
                if best.is_none_or(|b| candidate.confidence > b.confidence) {
                    best = Some(candidate);
                }
            }
        }
        if best.is_some() {
            return best;
        }
    }
    None
}

/// Reciprocal-sum combination of per-engine confidences.
///
/// Equals `c` for a single contributor and never exceeds the smallest input.
pub fn aggregate_confidence(confidences: &[f32]) -> f32 {
    if confidences.is_empty() || confidences.iter().any(|c| *c <= 0.0) {
        return 0.0;
    }
    let penalty: f32 = confidences.iter().map(|c| (1.0 - c.min(1.0)) / c).sum();
    1.0 / (1.0 + penalty)
}

/// Merges the results of every engine for one document.
///
/// Fails only when no engine supplied a label for some dimension, which
/// means both local engines failed.
pub fn merge(
    document: &Document,
    normalized: &NormalizedText,
    results: &[EngineResult],
) -> Result<ClassificationRecord, TriageError> {
    let mut labels = BTreeMap::new();
    let mut provenance = BTreeMap::new();
    let mut weakest: BTreeMap<EngineKind, f32> = BTreeMap::new();

    for (dimension, tiers) in PRIORITY {
        let winner = pick(dimension, tiers, results).ok_or_else(|| TriageError::NoUsableEngine {
            document_id: document.id.clone(),
        })?;
        labels.insert(dimension, winner.label);
        provenance.insert(dimension, winner.engine);
        weakest
            .entry(winner.engine)
            .and_modify(|c: &mut f32| *c = c.min(winner.confidence))
            .or_insert(winner.confidence);
    }

    let confidences: Vec<f32> = weakest.values().copied().collect();
    let confidence = aggregate_confidence(&confidences);
    // Lowest contributor; ties keep engine order.
    if let Some((engine, _)) = weakest
        .iter()
        .fold(None::<(EngineKind, f32)>, |acc, (engine, c)| match acc {
            Some((_, best)) if best <= *c => acc,
            _ => Some((*engine, *c)),
        })
    {
        provenance.insert(Dimension::Confidence, engine);
    }

    Ok(ClassificationRecord {
        document_id: document.id.clone(),
        sentiment: match labels.get(&Dimension::Sentiment) {
            Some(Label::Sentiment(v)) => *v,
            _ => Sentiment::Neutral,
        },
        is_claim: matches!(labels.get(&Dimension::IsClaim), Some(Label::Claim(true))),
        urgency: match labels.get(&Dimension::Urgency) {
            Some(Label::Urgency(v)) => *v,
            _ => Urgency::LOWEST,
        },
        topic: match labels.get(&Dimension::Topic) {
            Some(Label::Topic(v)) => *v,
            _ => Topic::Other,
        },
        incident_type: match labels.get(&Dimension::IncidentType) {
            Some(Label::Incident(v)) => *v,
            _ => IncidentType::Unspecified,
        },
        responsible: match labels.get(&Dimension::Responsible) {
            Some(Label::Responsible(v)) => *v,
            _ => Responsible::None,
        },
        confidence,
        engine_provenance: provenance,
        consistency_adjustments: Vec::new(),
        quality_score: normalized.quality_score,
        passthrough: document.passthrough.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use triage_core::EngineFailure;

    fn rule(conf: f32) -> EngineResult {
        EngineResult::ok(EngineKind::Rule)
            .with(Label::Claim(true), conf)
            .with(Label::Urgency(Urgency::High), conf)
            .with(Label::Topic(Topic::Network), conf * 0.6)
            .with(Label::Incident(IncidentType::ConnectionOutage), conf * 0.6)
            .with(Label::Responsible(Responsible::Technical), conf * 0.6)
    }

    fn transformer(conf: f32) -> EngineResult {
        EngineResult::ok(EngineKind::Transformer).with(Label::Sentiment(Sentiment::Negative), conf)
    }

    fn llm(kind: EngineKind, topic: Topic, conf: f32) -> EngineResult {
        EngineResult::ok(kind)
            .with(Label::Sentiment(Sentiment::Negative), conf)
            .with(Label::Claim(true), conf)
            .with(Label::Urgency(Urgency::Critical), conf)
            .with(Label::Topic(topic), conf)
            .with(Label::Incident(IncidentType::ConnectionOutage), conf)
            .with(Label::Responsible(Responsible::Technical), conf)
    }

    fn doc() -> (Document, NormalizedText) {
        (
            Document::new("d1", "plus de réseau"),
            NormalizedText {
                clean_text: "plus de reseau".into(),
                quality_score: 70,
            },
        )
    }

    #[test]
    fn local_engines_only() {
        let (d, n) = doc();
        let record = merge(&d, &n, &[rule(0.8), transformer(0.9)]).unwrap();
        assert_eq!(record.topic, Topic::Network);
        assert_eq!(record.engine_provenance[&Dimension::Sentiment], EngineKind::Transformer);
        assert_eq!(record.engine_provenance[&Dimension::Topic], EngineKind::Rule);
        for engine in record.engine_provenance.values() {
            assert!(!engine.is_llm());
        }
        assert_eq!(record.quality_score, 70);
    }

    #[test]
    fn llm_outranks_local_engines() {
        let (d, n) = doc();
        let results = [rule(0.9), transformer(0.99), llm(EngineKind::LocalLlm, Topic::Fiber, 0.5)];
        let record = merge(&d, &n, &results).unwrap();
        assert_eq!(record.topic, Topic::Fiber);
        assert_eq!(record.urgency, Urgency::Critical);
        assert_eq!(record.engine_provenance[&Dimension::Sentiment], EngineKind::LocalLlm);
    }

    #[test]
    fn higher_confidence_wins_inside_tier() {
        let (d, n) = doc();
        let results = [
            rule(0.8),
            transformer(0.8),
            llm(EngineKind::LocalLlm, Topic::Fiber, 0.6),
            llm(EngineKind::CloudLlm, Topic::Mobile, 0.9),
        ];
        let record = merge(&d, &n, &results).unwrap();
        assert_eq!(record.topic, Topic::Mobile);
        assert_eq!(record.engine_provenance[&Dimension::Topic], EngineKind::CloudLlm);
    }

    #[test]
    fn equal_confidence_keeps_table_order() {
        let (d, n) = doc();
        let results = [
            rule(0.8),
            transformer(0.8),
            llm(EngineKind::CloudLlm, Topic::Mobile, 0.7),
            llm(EngineKind::LocalLlm, Topic::Fiber, 0.7),
        ];
        let record = merge(&d, &n, &results).unwrap();
        assert_eq!(record.topic, Topic::Fiber);
    }

    #[test]
    fn failed_llm_falls_back_to_rule() {
        let (d, n) = doc();
        let results = [
            rule(0.8),
            transformer(0.8),
            EngineResult::failed(
                EngineKind::LocalLlm,
                EngineFailure::TimedOut(std::time::Duration::from_secs(1)),
            ),
        ];
        let record = merge(&d, &n, &results).unwrap();
        assert_eq!(record.engine_provenance[&Dimension::Topic], EngineKind::Rule);
    }

    #[test]
    fn missing_local_engines_is_fatal() {
        let (d, n) = doc();
        let err = merge(&d, &n, &[rule(0.8)]).unwrap_err();
        assert!(matches!(err, TriageError::NoUsableEngine { ref document_id } if document_id == "d1"));
    }

    #[test]
    fn confidence_never_exceeds_weakest_contributor() {
        let (d, n) = doc();
        let record = merge(&d, &n, &[rule(0.8), transformer(0.9)]).unwrap();
        // Rule's weakest winning dimension is 0.8 * 0.6.
        assert!(record.confidence <= 0.48 + 1e-6);
        assert!(record.confidence > 0.0);
        assert_eq!(record.engine_provenance[&Dimension::Confidence], EngineKind::Rule);
    }

    #[test]
    fn aggregate_properties() {
        assert!((aggregate_confidence(&[0.7]) - 0.7).abs() < 1e-6);
        let combined = aggregate_confidence(&[0.9, 0.6]);
        assert!(combined <= 0.6);
        assert_eq!(aggregate_confidence(&[0.5, 0.0]), 0.0);
        assert_eq!(aggregate_confidence(&[]), 0.0);
        assert!((aggregate_confidence(&[1.0, 1.0]) - 1.0).abs() < 1e-6);
    }
}
