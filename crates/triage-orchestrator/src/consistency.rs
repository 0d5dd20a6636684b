// SPDX-FileCopyrightText: 2026 Triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-merge cross-dimension repair.
//!
//! Rules run in the fixed order of [`RULES`]. A rule only demotes or aligns
//! existing values and logs one adjustment each time it changes something.
//! Running the pass twice gives the same record as running it once.

use triage_core::{ClassificationRecord, IncidentType, Responsible, Sentiment, Urgency};

/// A named repair rule. Returns the adjustment text when it changed the record.
pub struct Rule {
    pub name: &'static str,
    apply: fn(&mut ClassificationRecord) -> Option<String>,
}

/// Repair rules in application order.
pub const RULES: [Rule; 4] = [
    Rule {
        name: "negative-without-claim",
        apply: negative_without_claim,
    },
    Rule {
        name: "non-claim-baseline",
        apply: non_claim_baseline,
    },
    Rule {
        name: "no-incident-cap",
        apply: no_incident_cap,
    },
    Rule {
        name: "information-cap",
        apply: information_cap,
    },
];

/// Negative text that is not a claim was rated urgent on its own: the
/// urgency came from tone, not from a problem to fix.
fn negative_without_claim(r: &mut ClassificationRecord) -> Option<String> {
    if r.sentiment == Sentiment::Negative && !r.is_claim && r.urgency >= Urgency::High {
        let before = r.urgency;
        r.urgency = Urgency::LOWEST;
        return Some(format!(
            "urgency {before} -> {}: negative sentiment without a claim",
            r.urgency
        ));
    }
    None
}

fn non_claim_baseline(r: &mut ClassificationRecord) -> Option<String> {
    if r.is_claim {
        return None;
    }
    let mut changes = Vec::new();
    if r.urgency != Urgency::LOWEST {
        changes.push(format!("urgency {} -> {}", r.urgency, Urgency::LOWEST));
        r.urgency = Urgency::LOWEST;
    }
    if r.responsible != Responsible::None {
        changes.push(format!("responsible {} -> {}", r.responsible, Responsible::None));
        r.responsible = Responsible::None;
    }
    if changes.is_empty() {
        None
    } else {
        Some(format!("{}: not a claim", changes.join(", ")))
    }
}

fn no_incident_cap(r: &mut ClassificationRecord) -> Option<String> {
    if r.incident_type == IncidentType::None && r.urgency == Urgency::HIGHEST {
        r.urgency = Urgency::High;
        return Some(format!(
            "urgency {} -> {}: no incident reported",
            Urgency::HIGHEST,
            Urgency::High
        ));
    }
    None
}

fn information_cap(r: &mut ClassificationRecord) -> Option<String> {
    if r.incident_type == IncidentType::Information && r.urgency >= Urgency::High {
        let before = r.urgency;
        r.urgency = Urgency::Medium;
        return Some(format!(
            "urgency {before} -> {}: information request",
            Urgency::Medium
        ));
    }
    None
}

/// Applies [`RULES`] in order.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsistencyEnforcer;

impl ConsistencyEnforcer {
    pub fn repair(&self, mut record: ClassificationRecord) -> ClassificationRecord {
        for rule in &RULES {
            if let Some(detail) = (rule.apply)(&mut record) {
                tracing::debug!(document_id = %record.document_id, rule = rule.name, %detail, "consistency repair");
                record
                    .consistency_adjustments
                    .push(format!("{}: {detail}", rule.name));
            }
        }
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::BTreeMap;
    use strum::IntoEnumIterator;
    use triage_core::Topic;

    fn record(
        sentiment: Sentiment,
        is_claim: bool,
        urgency: Urgency,
        incident_type: IncidentType,
        responsible: Responsible,
    ) -> ClassificationRecord {
        ClassificationRecord {
            document_id: "r".into(),
            sentiment,
            is_claim,
            urgency,
            topic: Topic::Network,
            incident_type,
            responsible,
            confidence: 0.7,
            engine_provenance: BTreeMap::new(),
            consistency_adjustments: Vec::new(),
            quality_score: 60,
            passthrough: BTreeMap::new(),
        }
    }

    #[test]
    fn coherent_claim_is_untouched() {
        let r = record(
            Sentiment::Negative,
            true,
            Urgency::Critical,
            IncidentType::ConnectionOutage,
            Responsible::Technical,
        );
        assert_eq!(ConsistencyEnforcer.repair(r.clone()), r);
    }

    #[test]
    fn negative_non_claim_urgency_is_downgraded_with_explanation() {
        let r = ConsistencyEnforcer.repair(record(
            Sentiment::Negative,
            false,
            Urgency::High,
            IncidentType::None,
            Responsible::Technical,
        ));
        assert_eq!(r.urgency, Urgency::Low);
        assert_eq!(r.responsible, Responsible::None);
        assert_eq!(r.consistency_adjustments.len(), 2);
        assert!(r.consistency_adjustments[0].starts_with("negative-without-claim: urgency high -> low"));
        assert_eq!(
            r.consistency_adjustments[1],
            "non-claim-baseline: responsible technical -> none: not a claim"
        );
    }

    #[test]
    fn non_claim_is_aligned_to_baseline() {
        let r = ConsistencyEnforcer.repair(record(
            Sentiment::Positive,
            false,
            Urgency::Medium,
            IncidentType::Information,
            Responsible::CustomerService,
        ));
        assert_eq!(r.urgency, Urgency::Low);
        assert_eq!(r.responsible, Responsible::None);
        assert_eq!(r.consistency_adjustments.len(), 1);
    }

    #[test]
    fn no_incident_caps_critical() {
        let r = ConsistencyEnforcer.repair(record(
            Sentiment::Negative,
            true,
            Urgency::Critical,
            IncidentType::None,
            Responsible::Technical,
        ));
        assert_eq!(r.urgency, Urgency::High);
        assert_eq!(r.consistency_adjustments, vec!["no-incident-cap: urgency critical -> high: no incident reported"]);
    }

    #[test]
    fn information_caps_at_medium() {
        let r = ConsistencyEnforcer.repair(record(
            Sentiment::Neutral,
            true,
            Urgency::High,
            IncidentType::Information,
            Responsible::CustomerService,
        ));
        assert_eq!(r.urgency, Urgency::Medium);
    }

    #[test]
    fn never_fabricates_values() {
        for sentiment in Sentiment::iter() {
            for incident in IncidentType::iter() {
                let before = record(sentiment, true, Urgency::Medium, incident, Responsible::Network);
                let after = ConsistencyEnforcer.repair(before.clone());
                assert_eq!(after.sentiment, before.sentiment);
                assert_eq!(after.topic, before.topic);
                assert_eq!(after.incident_type, before.incident_type);
                assert!(after.urgency <= before.urgency);
            }
        }
    }

    fn any_record() -> impl Strategy<Value = ClassificationRecord> {
        let sentiments: Vec<_> = Sentiment::iter().collect();
        let urgencies: Vec<_> = Urgency::iter().collect();
        let incidents: Vec<_> = IncidentType::iter().collect();
        let responsibles: Vec<_> = Responsible::iter().collect();
        (
            proptest::sample::select(sentiments),
            any::<bool>(),
            proptest::sample::select(urgencies),
            proptest::sample::select(incidents),
            proptest::sample::select(responsibles),
        )
            .prop_map(|(s, c, u, i, r)| record(s, c, u, i, r))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(1000))]

        #[test]
        fn repair_is_idempotent(r in any_record()) {
            let once = ConsistencyEnforcer.repair(r);
            let twice = ConsistencyEnforcer.repair(once.clone());
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn non_claims_are_never_top_urgency(r in any_record()) {
            let repaired = ConsistencyEnforcer.repair(r);
            if !repaired.is_claim {
                prop_assert_ne!(repaired.urgency, Urgency::HIGHEST);
                prop_assert_eq!(repaired.urgency, Urgency::LOWEST);
            }
        }

        #[test]
        fn no_incident_is_never_critical(r in any_record()) {
            let repaired = ConsistencyEnforcer.repair(r);
            if repaired.incident_type == IncidentType::None {
                prop_assert_ne!(repaired.urgency, Urgency::Critical);
            }
        }
    }
}
