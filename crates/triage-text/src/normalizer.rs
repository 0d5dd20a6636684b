// SPDX-FileCopyrightText: 2026 Triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The text normalizer.
//!
//! Cleaning steps, in order: control characters, URLs, mentions, hashtags,
//! emoji, accent folding, casing, whitespace, stopwords, and finally
//! re-injection of domain keywords that were removed along the way (for
//! example the `panne` in a stripped `#panne`).

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;
use triage_config::model::NormalizerConfig;
use triage_core::NormalizedText;

use crate::emoji::replace_emoji;
use crate::fold::fold;

static URL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:https?://|www\.)\S+").unwrap());

static MENTION_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"@\w+").unwrap());

static HASHTAG_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"#\w+").unwrap());

static WHITESPACE_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Operator vocabulary that stopword filtering never removes.
///
/// Entries are stored folded; multi-word entries are re-injected with
/// underscores.
const DOMAIN_KEYWORDS: &[&str] = &[
    "free",
    "freebox",
    "free mobile",
    "fibre",
    "fiber",
    "connexion",
    "connection",
    "reseau",
    "4g",
    "5g",
    "data",
    "debit",
    "facture",
    "facturation",
    "reclamation",
    "incident",
    "panne",
    "bug",
    "sav",
    "support",
    "service client",
    "assistance",
    "wifi",
    "box",
    "modem",
];

/// Words per text at which the length component of the quality score saturates.
const FULL_LENGTH_WORDS: f32 = 8.0;

/// Deterministic, stateless text cleaner.
#[derive(Debug, Clone)]
pub struct TextNormalizer {
    config: NormalizerConfig,
    stopwords: HashSet<String>,
}

impl Default for TextNormalizer {
    fn default() -> Self {
        Self::new(&NormalizerConfig::default())
    }
}

impl TextNormalizer {
    pub fn new(config: &NormalizerConfig) -> Self {
        let stopwords = config
            .extra_stopwords
            .iter()
            .map(|w| fold(w.trim()))
            .filter(|w| !w.is_empty())
            .collect();
        Self {
            config: config.clone(),
            stopwords,
        }
    }

    /// Cleans `raw_text`. Never fails: input with no usable content yields
    /// an empty text with quality 0.
    pub fn normalize(&self, raw_text: &str) -> NormalizedText {
        let clean_text = self.clean(raw_text);
        if !clean_text.chars().any(char::is_alphanumeric) {
            debug!(raw_len = raw_text.len(), "normalization degraded");
            return NormalizedText::degraded();
        }
        let quality_score = quality_score(&clean_text);
        NormalizedText {
            clean_text,
            quality_score,
        }
    }

    fn clean(&self, raw_text: &str) -> String {
        let c = &self.config;

        let mut text: String = raw_text
            .chars()
            .map(|ch| if ch.is_control() { ' ' } else { ch })
            .collect();

        if c.remove_urls {
            text = URL_PATTERN.replace_all(&text, " ").into_owned();
        }
        if c.remove_mentions {
            text = MENTION_PATTERN.replace_all(&text, " ").into_owned();
        }
        text = if c.remove_hashtags {
            HASHTAG_PATTERN.replace_all(&text, " ").into_owned()
        } else {
            text.replace('#', " ")
        };

        text = replace_emoji(&text, c.convert_emojis);

        if c.fold_accents {
            text = fold(&text);
        } else if c.lowercase {
            text = text.to_lowercase();
        }

        let collapsed = WHITESPACE_PATTERN.replace_all(text.trim(), " ");

        let mut tokens: Vec<&str> = collapsed
            .split(' ')
            .filter(|t| !t.is_empty())
            .filter(|t| {
                let key = fold(t);
                !self.stopwords.contains(&key)
                    || (c.preserve_domain_keywords && DOMAIN_KEYWORDS.contains(&key.as_str()))
            })
            .collect();

        let mut reinjected = Vec::new();
        if c.preserve_domain_keywords && !tokens.is_empty() {
            let raw_folded = fold(raw_text);
            let kept_folded = fold(&tokens.join(" "));
            for keyword in DOMAIN_KEYWORDS {
                if contains_word(&raw_folded, keyword) && !contains_word(&kept_folded, keyword) {
                    reinjected.push(keyword.replace(' ', "_"));
                }
            }
        }
        tokens.extend(reinjected.iter().map(String::as_str));

        tokens.join(" ")
    }
}

/// Whether `phrase` occurs in `haystack` on word boundaries.
fn contains_word(haystack: &str, phrase: &str) -> bool {
    haystack.match_indices(phrase).any(|(start, _)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + phrase.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

/// `50 * min(words / 8, 1) + 50 * alphabetic_ratio`, rounded, in `0..=100`.
fn quality_score(clean_text: &str) -> u8 {
    let words = clean_text.split_whitespace().count() as f32;
    let visible: Vec<char> = clean_text.chars().filter(|c| !c.is_whitespace()).collect();
    if visible.is_empty() {
        return 0;
    }
    let alphabetic = visible.iter().filter(|c| c.is_alphabetic()).count() as f32;
    let length_part = (words / FULL_LENGTH_WORDS).min(1.0);
    let alpha_part = alphabetic / visible.len() as f32;
    (50.0 * length_part + 50.0 * alpha_part).round().clamp(0.0, 100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalizer() -> TextNormalizer {
        TextNormalizer::default()
    }

    #[test]
    fn strips_urls_and_mentions() {
        let n = normalizer().normalize("@free toujours en panne https://t.co/xyz www.free.fr ");
        assert!(!n.clean_text.contains("http"));
        assert!(!n.clean_text.contains("www"));
        assert!(!n.clean_text.contains('@'));
        assert!(n.clean_text.starts_with("toujours en panne"));
    }

    #[test]
    fn mentioned_operator_name_is_reinjected() {
        let n = normalizer().normalize("@free toujours en panne");
        assert_eq!(n.clean_text, "toujours en panne free");
    }

    #[test]
    fn hashtag_symbol_is_removed_by_default() {
        let n = normalizer().normalize("Encore une #panne fibre");
        assert_eq!(n.clean_text, "encore une panne fibre");
    }

    #[test]
    fn removed_hashtag_keyword_is_reinjected() {
        let config = NormalizerConfig {
            remove_hashtags: true,
            ..NormalizerConfig::default()
        };
        let n = TextNormalizer::new(&config).normalize("Encore coupé #panne");
        assert_eq!(n.clean_text, "encore coupé panne");
    }

    #[test]
    fn collapses_whitespace_and_lowercases() {
        let n = normalizer().normalize("  Plus   DE\tRéseau \n ");
        assert_eq!(n.clean_text, "plus de réseau");
    }

    #[test]
    fn folds_accents_when_enabled() {
        let config = NormalizerConfig {
            fold_accents: true,
            ..NormalizerConfig::default()
        };
        let n = TextNormalizer::new(&config).normalize("Débit très lent");
        assert_eq!(n.clean_text, "debit tres lent");
    }

    #[test]
    fn extra_stopwords_are_removed_but_domain_words_kept() {
        let config = NormalizerConfig {
            extra_stopwords: vec!["svp".into(), "box".into()],
            ..NormalizerConfig::default()
        };
        let n = TextNormalizer::new(&config).normalize("Réparez ma box svp");
        assert_eq!(n.clean_text, "réparez ma box");
    }

    #[test]
    fn converts_emoji() {
        let n = normalizer().normalize("Merci 🙏 super service 😊🦄");
        assert_eq!(n.clean_text, "merci thanks super service smile");
    }

    #[test]
    fn empty_and_symbol_only_input_is_degraded() {
        for raw in ["", "   ", "https://t.co/abc", "🦄🦄", "!!! ???", "@free"] {
            let n = normalizer().normalize(raw);
            assert_eq!(n.quality_score, 0, "input {raw:?}");
            assert_eq!(n.clean_text, "", "input {raw:?}");
        }
    }

    #[test]
    fn longer_clean_text_scores_higher() {
        let short = normalizer().normalize("panne");
        let long = normalizer().normalize("Plus de réseau depuis ce matin, c'est inadmissible");
        assert!(long.quality_score > short.quality_score);
        assert!(long.quality_score <= 100);
        assert!(short.quality_score > 0);
    }

    #[test]
    fn contains_word_respects_boundaries() {
        assert!(contains_word("ma box est morte", "box"));
        assert!(!contains_word("ma boxe est morte", "box"));
        assert!(contains_word("appel au service client", "service client"));
    }

    #[test]
    fn quality_score_is_deterministic() {
        let a = normalizer().normalize("Facture erronée ce mois-ci");
        let b = normalizer().normalize("Facture erronée ce mois-ci");
        assert_eq!(a, b);
    }

    mod prop {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn never_panics_and_score_in_range(raw in "\\PC{0,200}") {
                let n = normalizer().normalize(&raw);
                prop_assert!(n.quality_score <= 100);
                prop_assert_eq!(n.clean_text.is_empty(), n.quality_score == 0);
            }
        }
    }
}
