// SPDX-FileCopyrightText: 2026 Triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sentiment model trait.

use triage_core::TriageError;

/// Index of each class in a logit vector.
pub const NEGATIVE: usize = 0;
pub const NEUTRAL: usize = 1;
pub const POSITIVE: usize = 2;

/// A three-class sentiment model.
pub trait SentimentModel: Send + Sync + 'static {
    /// Short identifier for logs.
    fn name(&self) -> &str;

    /// Raw scores in `[negative, neutral, positive]` order.
    fn predict(&self, text: &str) -> Result<[f32; 3], TriageError>;
}

/// Numerically stable softmax.
pub fn softmax(logits: [f32; 3]) -> [f32; 3] {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps = logits.map(|l| (l - max).exp());
    let sum: f32 = exps.iter().sum();
    exps.map(|e| e / sum)
}
