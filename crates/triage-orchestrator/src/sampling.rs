// SPDX-FileCopyrightText: 2026 Triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deterministic stratified sampling for the LLM engines.
//!
//! Strata, in priority order:
//! 1. claims the rule engine rates high or critical (always sampled);
//! 2. half of the remaining claims;
//! 3. non-claims, filling up to `ceil(n * fraction)`.
//!
//! Leftover claims top up the sample if the target is still not reached.
//! Within a stratum, picks are evenly strided over the stratum so the same
//! input always yields the same sample.

use triage_core::{Dimension, EngineResult, Label, Urgency};

/// Returns one flag per document: whether the LLM engines should see it.
///
/// `signals` holds the rule engine result for each document, in input order.
pub fn select_sample(signals: &[EngineResult], fraction: f64) -> Vec<bool> {
    let n = signals.len();
    if n == 0 || fraction.is_nan() || fraction <= 0.0 {
        return vec![false; n];
    }
    if fraction >= 1.0 {
        return vec![true; n];
    }

    let target = ((n as f64) * fraction).ceil() as usize;
    let mut urgent_claims = Vec::new();
    let mut other_claims = Vec::new();
    let mut non_claims = Vec::new();

    for (index, result) in signals.iter().enumerate() {
        let is_claim = matches!(result.label(Dimension::IsClaim), Some(Label::Claim(true)));
        let urgent = matches!(
            result.label(Dimension::Urgency),
            Some(Label::Urgency(u)) if u >= Urgency::High
        );
        match (is_claim, urgent) {
            (true, true) => urgent_claims.push(index),
            (true, false) => other_claims.push(index),
            (false, _) => non_claims.push(index),
        }
    }

    let mut selected = vec![false; n];
    let mut count = 0;

    for &index in &urgent_claims {
        selected[index] = true;
        count += 1;
    }

    let half = other_claims.len().div_ceil(2).min(target.saturating_sub(count));
    count += pick_strided(&other_claims, half, &mut selected);
    count += pick_strided(&non_claims, target.saturating_sub(count), &mut selected);

    if count < target {
        let leftover: Vec<usize> = other_claims
            .iter()
            .copied()
            .filter(|&index| !selected[index])
            .collect();
        pick_strided(&leftover, target - count, &mut selected);
    }

    selected
}

/// Marks `k` evenly spaced members of `stratum`, returning how many were marked.
fn pick_strided(stratum: &[usize], k: usize, selected: &mut [bool]) -> usize {
    let k = k.min(stratum.len());
    for i in 0..k {
        selected[stratum[i * stratum.len() / k]] = true;
    }
    k
}
