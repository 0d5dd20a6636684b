// SPDX-FileCopyrightText: 2026 Triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Weighted polarity lexicon (French and English).
//!
//! Words carry a signed weight; multi-word phrases are matched first and
//! consume their tokens. A polarity word preceded by a negator within
//! [`NEGATION_WINDOW`] tokens has its sign flipped and its weight damped.
//! Scores feed the negative and positive logits against a constant neutral
//! bias, so text with no evidence is neutral.

use std::collections::HashMap;

use triage_core::TriageError;

use crate::model::SentimentModel;

/// Signed single-word weights. Positive values are positive sentiment.
const WORDS: &[(&str, f32)] = &[
    // positive
    ("merci", 1.5),
    ("remercie", 1.5),
    ("super", 1.5),
    ("bravo", 1.5),
    ("excellent", 2.0),
    ("excellente", 2.0),
    ("parfait", 1.5),
    ("parfaitement", 1.0),
    ("genial", 1.5),
    ("top", 1.0),
    ("content", 1.5),
    ("contente", 1.5),
    ("satisfait", 1.5),
    ("satisfaite", 1.5),
    ("ravi", 2.0),
    ("ravie", 2.0),
    ("resolu", 1.0),
    ("resolue", 1.0),
    ("regle", 1.0),
    ("efficace", 1.0),
    ("rapide", 0.5),
    ("bien", 0.5),
    ("thanks", 1.5),
    ("love", 1.5),
    ("smile", 1.5),
    ("thumbs_up", 1.5),
    ("applause", 1.0),
    ("celebration", 1.0),
    ("laughing", 0.5),
    ("great", 1.5),
    ("good", 1.0),
    ("happy", 1.5),
    // negative
    ("inadmissible", -2.0),
    ("inacceptable", -2.0),
    ("scandale", -2.0),
    ("scandaleux", -2.0),
    ("honteux", -2.0),
    ("honte", -1.5),
    ("nul", -1.5),
    ("nulle", -1.5),
    ("pourri", -2.0),
    ("minable", -2.0),
    ("lamentable", -2.0),
    ("catastrophe", -2.0),
    ("catastrophique", -2.0),
    ("pire", -1.5),
    ("decu", -1.5),
    ("decue", -1.5),
    ("mecontent", -1.5),
    ("mecontente", -1.5),
    ("insatisfait", -1.5),
    ("marre", -1.5),
    ("colere", -1.5),
    ("inutile", -1.0),
    ("panne", -1.0),
    ("coupure", -1.0),
    ("probleme", -1.0),
    ("bug", -1.0),
    ("lenteur", -1.0),
    ("lent", -0.5),
    ("angry", -2.0),
    ("sad", -1.5),
    ("crying", -1.5),
    ("disappointed", -1.5),
    ("weary", -1.0),
    ("thumbs_down", -1.5),
    ("broken_heart", -1.5),
    ("bad", -1.5),
    ("terrible", -1.5),
    ("worst", -2.0),
    ("awful", -2.0),
    ("hate", -2.0),
];

/// Signed phrase weights, written as folded tokens.
const PHRASES: &[(&[&str], f32)] = &[
    (&["plus", "de", "reseau"], -1.5),
    (&["plus", "de", "connexion"], -1.5),
    (&["plus", "d", "internet"], -1.5),
    (&["ne", "fonctionne", "pas"], -1.5),
    (&["ne", "fonctionne", "plus"], -1.5),
    (&["ne", "marche", "pas"], -1.5),
    (&["ne", "marche", "plus"], -1.5),
    (&["toujours", "pas"], -1.0),
    (&["ras", "le", "bol"], -2.0),
    (&["tout", "est", "bon"], 1.0),
    (&["fonctionne", "a", "nouveau"], 1.5),
    (&["pas", "terrible"], -1.5),
];

const NEGATORS: &[&str] = &["pas", "jamais", "aucun", "aucune", "sans", "ni", "not", "never", "no"];

/// Tokens looked back from a polarity word for a negator.
pub const NEGATION_WINDOW: usize = 3;

/// Weight multiplier after a negation flip ("pas content" is weaker than "mecontent").
const NEGATION_DAMPING: f32 = 0.5;

/// Scale from accumulated weight to logit.
const LOGIT_SCALE: f32 = 1.5;

/// Constant neutral logit; evidence must beat it to leave neutral.
const NEUTRAL_BIAS: f32 = 1.0;

/// Lexicon-based sentiment model.
#[derive(Debug, Clone)]
pub struct LexiconModel {
    words: HashMap<&'static str, f32>,
}

impl Default for LexiconModel {
    fn default() -> Self {
        Self::new()
    }
}

impl LexiconModel {
    pub fn new() -> Self {
        Self {
            words: WORDS.iter().copied().collect(),
        }
    }

    /// Longest phrase starting at the head of `tokens`.
    fn match_phrase(tokens: &[&str]) -> Option<(usize, f32)> {
        PHRASES
            .iter()
            .filter(|(phrase, _)| tokens.starts_with(phrase))
            .max_by_key(|(phrase, _)| phrase.len())
            .map(|(phrase, weight)| (phrase.len(), *weight))
    }

    fn is_negated(tokens: &[&str], index: usize) -> bool {
        tokens[index.saturating_sub(NEGATION_WINDOW)..index]
            .iter()
            .any(|t| NEGATORS.contains(t))
    }

    /// Accumulated `(negative, positive)` evidence.
    pub fn score(&self, text: &str) -> (f32, f32) {
        let folded = triage_text::fold(text);
        let tokens: Vec<&str> = folded
            .split(|c: char| !(c.is_alphanumeric() || c == '_'))
            .filter(|t| !t.is_empty())
            .collect();

        let mut negative = 0.0;
        let mut positive = 0.0;
        let mut add = |weight: f32| {
            if weight > 0.0 {
                positive += weight;
            } else {
                negative -= weight;
            }
        };

        let mut i = 0;
        while i < tokens.len() {
            if let Some((len, weight)) = Self::match_phrase(&tokens[i..]) {
                add(weight);
                i += len;
                continue;
            }
            if let Some(weight) = self.words.get(tokens[i]) {
                if Self::is_negated(&tokens, i) {
                    add(-weight * NEGATION_DAMPING);
                } else {
                    add(*weight);
                }
            }
            i += 1;
        }

        (negative, positive)
    }
}

impl SentimentModel for LexiconModel {
    fn name(&self) -> &str {
        "lexicon"
    }

    fn predict(&self, text: &str) -> Result<[f32; 3], TriageError> {
        let (negative, positive) = self.score(text);
        Ok([
            LOGIT_SCALE * negative,
            NEUTRAL_BIAS,
            LOGIT_SCALE * positive,
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NEGATIVE, NEUTRAL, POSITIVE};

    fn argmax(logits: [f32; 3]) -> usize {
        let mut best = 0;
        for i in 1..3 {
            if logits[i] > logits[best] {
                best = i;
            }
        }
        best
    }

    #[test]
    fn outage_complaint_is_negative() {
        let m = LexiconModel::new();
        let logits = m
            .predict("plus de réseau depuis ce matin, c'est inadmissible")
            .unwrap();
        assert_eq!(argmax(logits), NEGATIVE);
    }

    #[test]
    fn thanks_is_positive() {
        let m = LexiconModel::new();
        let logits = m.predict("merci pour votre aide, tout est résolu").unwrap();
        assert_eq!(argmax(logits), POSITIVE);
    }

    #[test]
    fn no_evidence_is_neutral() {
        let m = LexiconModel::new();
        let logits = m.predict("quels sont les horaires de la boutique").unwrap();
        assert_eq!(argmax(logits), NEUTRAL);
    }

    #[test]
    fn negation_flips_polarity() {
        let m = LexiconModel::new();
        let (neg, pos) = m.score("je ne suis pas du tout content");
        // "pas" is within three tokens of "content"
        assert!(neg > 0.0);
        assert_eq!(pos, 0.0);
    }

    #[test]
    fn phrases_take_precedence_over_words() {
        let m = LexiconModel::new();
        // "pas terrible" is one negative phrase, not a negated negative word
        let (neg, pos) = m.score("pas terrible");
        assert_eq!(neg, 1.5);
        assert_eq!(pos, 0.0);
    }

    #[test]
    fn emoji_words_carry_polarity() {
        let m = LexiconModel::new();
        let (neg, _) = m.score("encore coupé angry");
        assert!(neg >= 2.0);
    }
}
