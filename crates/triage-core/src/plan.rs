// SPDX-FileCopyrightText: 2026 Triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Execution plan value object.
//!
//! A plan is chosen once per run and passed explicitly into the orchestrator.
//! Its fields are private so that the rule engine and the transformer can
//! never be removed from it.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::types::EngineKind;

/// Per-call timeout applied to LLM engines without an explicit override.
pub const DEFAULT_LLM_TIMEOUT: Duration = Duration::from_secs(60);

/// Default number of concurrent LLM calls across a run.
pub const DEFAULT_MAX_IN_FLIGHT: usize = 4;

/// Cost/accuracy trade-off requested by the caller.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// Rule engine and transformer only.
    Fast,
    /// LLM engines on a stratified sample.
    #[default]
    Balanced,
    /// LLM engines on every document.
    Precise,
}

/// Which LLM engines a non-fast plan enables.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    #[default]
    Local,
    Cloud,
    Both,
}

impl LlmProvider {
    pub fn engines(self) -> &'static [EngineKind] {
        match self {
            LlmProvider::Local => &[EngineKind::LocalLlm],
            LlmProvider::Cloud => &[EngineKind::CloudLlm],
            LlmProvider::Both => &[EngineKind::LocalLlm, EngineKind::CloudLlm],
        }
    }
}

/// Engines, timeouts, and sampling policy for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionPlan {
    engines: Vec<EngineKind>,
    timeouts: BTreeMap<EngineKind, Duration>,
    sample_fraction: f64,
    max_in_flight: usize,
}

impl Default for ExecutionPlan {
    fn default() -> Self {
        Self::baseline()
    }
}

impl ExecutionPlan {
    /// Rule engine and transformer only.
    pub fn baseline() -> Self {
        Self {
            engines: vec![EngineKind::Rule, EngineKind::Transformer],
            timeouts: BTreeMap::new(),
            sample_fraction: 0.0,
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
        }
    }

    /// Builds the preset for `mode`.
    ///
    /// `sample_fraction` only applies to [`ExecutionMode::Balanced`]; precise
    /// mode always samples everything.
    pub fn for_mode(mode: ExecutionMode, provider: LlmProvider, sample_fraction: f64) -> Self {
        let plan = Self::baseline();
        match mode {
            ExecutionMode::Fast => plan,
            ExecutionMode::Balanced => provider
                .engines()
                .iter()
                .fold(plan, |p, kind| p.with_llm(*kind))
                .with_sample_fraction(sample_fraction),
            ExecutionMode::Precise => provider
                .engines()
                .iter()
                .fold(plan, |p, kind| p.with_llm(*kind))
                .with_sample_fraction(1.0),
        }
    }

    /// Adds an LLM engine. Non-LLM kinds and duplicates are ignored.
    pub fn with_llm(mut self, kind: EngineKind) -> Self {
        if kind.is_llm() && !self.engines.contains(&kind) {
            self.engines.push(kind);
        }
        self
    }

    pub fn with_timeout(mut self, kind: EngineKind, timeout: Duration) -> Self {
        self.timeouts.insert(kind, timeout);
        self
    }

    /// Sets the LLM sample fraction, clamped to `[0, 1]`.
    pub fn with_sample_fraction(mut self, fraction: f64) -> Self {
        self.sample_fraction = if fraction.is_nan() {
            0.0
        } else {
            fraction.clamp(0.0, 1.0)
        };
        self
    }

    pub fn with_max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.max_in_flight = max_in_flight.max(1);
        self
    }

    /// Returns a copy without the given LLM engine.
    ///
    /// The rule engine and the transformer cannot be removed; asking to drop
    /// them returns an unchanged copy.
    pub fn without(&self, kind: EngineKind) -> Self {
        let mut plan = self.clone();
        if kind.is_llm() {
            plan.engines.retain(|k| *k != kind);
        }
        plan
    }

    /// Enabled engines in declaration order.
    pub fn engines(&self) -> &[EngineKind] {
        &self.engines
    }

    pub fn llm_engines(&self) -> impl Iterator<Item = EngineKind> + '_ {
        self.engines.iter().copied().filter(|k| k.is_llm())
    }

    pub fn has_llm(&self) -> bool {
        self.llm_engines().next().is_some()
    }

    pub fn contains(&self, kind: EngineKind) -> bool {
        self.engines.contains(&kind)
    }

    pub fn timeout(&self, kind: EngineKind) -> Duration {
        self.timeouts
            .get(&kind)
            .copied()
            .unwrap_or(DEFAULT_LLM_TIMEOUT)
    }

    pub fn sample_fraction(&self) -> f64 {
        self.sample_fraction
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn baseline_always_has_rule_and_transformer() {
        let plan = ExecutionPlan::baseline();
        assert_eq!(plan.engines(), &[EngineKind::Rule, EngineKind::Transformer]);
        assert!(!plan.has_llm());
    }

    #[test]
    fn fast_mode_ignores_provider() {
        let plan = ExecutionPlan::for_mode(ExecutionMode::Fast, LlmProvider::Both, 0.5);
        assert!(!plan.has_llm());
    }

    #[test]
    fn balanced_mode_uses_sample_fraction() {
        let plan = ExecutionPlan::for_mode(ExecutionMode::Balanced, LlmProvider::Cloud, 0.2);
        assert_eq!(
            plan.engines(),
            &[EngineKind::Rule, EngineKind::Transformer, EngineKind::CloudLlm]
        );
        assert!((plan.sample_fraction() - 0.2).abs() < f64::EPSILON);
    }

    #[test]
    fn precise_mode_samples_everything() {
        let plan = ExecutionPlan::for_mode(ExecutionMode::Precise, LlmProvider::Both, 0.2);
        assert_eq!(plan.llm_engines().count(), 2);
        assert!((plan.sample_fraction() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn cannot_remove_local_engines() {
        let plan = ExecutionPlan::baseline()
            .without(EngineKind::Rule)
            .without(EngineKind::Transformer);
        assert!(plan.contains(EngineKind::Rule));
        assert!(plan.contains(EngineKind::Transformer));
    }

    #[test]
    fn without_drops_llm() {
        let plan = ExecutionPlan::for_mode(ExecutionMode::Precise, LlmProvider::Both, 1.0)
            .without(EngineKind::LocalLlm);
        assert!(!plan.contains(EngineKind::LocalLlm));
        assert!(plan.contains(EngineKind::CloudLlm));
    }

    #[test]
    fn with_llm_rejects_local_kinds_and_duplicates() {
        let plan = ExecutionPlan::baseline()
            .with_llm(EngineKind::Rule)
            .with_llm(EngineKind::LocalLlm)
            .with_llm(EngineKind::LocalLlm);
        assert_eq!(plan.engines().len(), 3);
    }

    #[test]
    fn sample_fraction_is_clamped() {
        assert_eq!(ExecutionPlan::baseline().with_sample_fraction(3.0).sample_fraction(), 1.0);
        assert_eq!(ExecutionPlan::baseline().with_sample_fraction(-1.0).sample_fraction(), 0.0);
        assert_eq!(ExecutionPlan::baseline().with_sample_fraction(f64::NAN).sample_fraction(), 0.0);
    }

    #[test]
    fn timeouts_default_and_override() {
        let plan = ExecutionPlan::baseline()
            .with_timeout(EngineKind::CloudLlm, Duration::from_secs(5));
        assert_eq!(plan.timeout(EngineKind::CloudLlm), Duration::from_secs(5));
        assert_eq!(plan.timeout(EngineKind::LocalLlm), DEFAULT_LLM_TIMEOUT);
    }

    #[test]
    fn mode_parses_case_insensitively() {
        use std::str::FromStr;
        assert_eq!(ExecutionMode::from_str("Precise").unwrap(), ExecutionMode::Precise);
        assert_eq!(LlmProvider::from_str("both").unwrap(), LlmProvider::Both);
    }
}
