// SPDX-FileCopyrightText: 2026 Triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Weighted keyword tables.
//!
//! Every fragment is a regex written against accent-folded, lowercase text
//! (see [`triage_text::fold`]) and matched on word boundaries.

use std::sync::LazyLock;

use regex::Regex;

/// Total weight and number of distinct patterns that matched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Score {
    pub weight: u32,
    pub hits: u32,
}

impl Score {
    pub fn is_zero(&self) -> bool {
        self.hits == 0
    }
}

/// A set of weighted patterns scored together.
#[derive(Debug)]
pub struct KeywordTable {
    patterns: Vec<(Regex, u32)>,
}

impl KeywordTable {
    /// Compiles `entries`. Fragments are wrapped in word boundaries.
    ///
    /// # Panics
    ///
    /// Panics on an invalid fragment; all tables are static.
    pub fn new(entries: &[(&str, u32)]) -> Self {
        let patterns = entries
            .iter()
            .map(|(fragment, weight)| (Regex::new(&format!(r"\b(?:{fragment})\b")).unwrap(), *weight))
            .collect();
        Self { patterns }
    }

    pub fn score(&self, folded: &str) -> Score {
        self.patterns
            .iter()
            .filter(|(re, _)| re.is_match(folded))
            .fold(Score::default(), |acc, (_, weight)| Score {
                weight: acc.weight + weight,
                hits: acc.hits + 1,
            })
    }

    pub fn matches(&self, folded: &str) -> bool {
        self.patterns.iter().any(|(re, _)| re.is_match(folded))
    }
}

pub static CLAIM: LazyLock<KeywordTable> = LazyLock::new(|| {
    KeywordTable::new(&[
        // explicit complaints and churn threats
        ("reclamation|plainte|je reclame", 3),
        ("rembourse(?:ment|z)?|dedommagement|compensation", 3),
        ("resilier|resiliation|changer d'operateur|quitter free", 3),
        ("inadmissible|inacceptable|scandale(?:ux)?|honteux", 3),
        // faults
        ("probleme|souci|bug|erreur|dysfonctionnement|defaillance", 2),
        ("panne|coupure|coupee?|interruption|deconnexion|deconnecte|perte de connexion", 2),
        ("ne (?:fonctionne|marche) (?:pas|plus)|marche plus|fonctionne plus", 2),
        ("impossible de|n'arrive pas|ne peut pas|bloquee?", 2),
        ("plus de (?:connexion|reseau|internet)|plus d'internet", 2),
        ("sans (?:connexion|internet|reseau)|aucune? (?:connexion|internet|reseau)", 2),
        ("toujours pas|encore rien|depuis plusieurs jours|depuis une semaine", 2),
        ("ras le bol|(?:j'en|en) ai marre", 2),
        // dissatisfaction
        ("decue?|mecontente?|insatisfaite?", 1),
        ("catastrophe|catastrophique|nulle?|pourri|minable|lamentable|pire", 1),
        ("lente?|lenteur", 1),
    ])
});

/// Evidence that the problem is solved or the message is praise.
pub static RESOLUTION: LazyLock<KeywordTable> = LazyLock::new(|| {
    KeywordTable::new(&[
        ("resolue?s?|reglee?s?|repare(?:e|s)?", 2),
        ("(?:fonctionne|marche) (?:a nouveau|de nouveau|bien|parfaitement)|remarche", 2),
        ("tout est (?:bon|ok|rentre dans l'ordre)", 2),
        ("merci|bravo|super|parfait|top|genial", 1),
    ])
});

pub static URGENCY_CRITICAL: LazyLock<KeywordTable> = LazyLock::new(|| {
    KeywordTable::new(&[
        ("urgente?s?|urgence|immediat(?:ement)?|au plus vite|tout de suite", 4),
        ("panne (?:totale|generale)|coupure (?:totale|complete|generale)|totalement coupee?", 4),
        ("(?:completement|totalement) hs|plus rien", 4),
        ("depuis (?:\\d+|plusieurs) semaines|depuis une semaine", 4),
        ("bloquee?s?|catastrophe|danger", 4),
    ])
});

pub static URGENCY_HIGH: LazyLock<KeywordTable> = LazyLock::new(|| {
    KeywordTable::new(&[
        ("critique|grave|serieux|prioritaire", 3),
        ("plus de (?:connexion|reseau|internet)|plus d'internet", 3),
        ("sans (?:connexion|internet|reseau)|aucune? (?:connexion|internet|reseau)", 3),
        ("depuis (?:plusieurs|des) jours|depuis \\d+ (?:jours|heures)|ca fait \\d+ (?:jours|semaines)", 3),
        ("plusieurs heures|depuis longtemps|toute la journee|depuis ce matin|depuis hier", 3),
        ("teletravail|(?:au|pour le) travail|professionnelle?|entreprise|impossible", 3),
        ("inadmissible|inacceptable", 3),
        ("toujours pas|a chaque fois|tous les jours|en permanence|systematiquement", 3),
    ])
});

pub static URGENCY_MEDIUM: LazyLock<KeywordTable> = LazyLock::new(|| {
    KeywordTable::new(&[
        ("probleme|souci|bug|erreur", 1),
        ("lenteur|lente?|ralentissement", 1),
        ("parfois|de temps en temps|occasionnellement", 1),
        ("coupure|panne|deconnexion", 1),
    ])
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fragments_match_on_word_boundaries() {
        let t = KeywordTable::new(&[("box", 1)]);
        assert!(t.matches("ma box est hs"));
        assert!(!t.matches("ma boxe est hs"));
    }

    #[test]
    fn score_sums_weights_of_distinct_patterns() {
        let t = KeywordTable::new(&[("panne", 2), ("urgent", 3), ("merci", 1)]);
        let s = t.score("panne urgent panne");
        assert_eq!(s, Score { weight: 5, hits: 2 });
    }

    #[test]
    fn apostrophe_fragments_match() {
        assert!(CLAIM.matches("plus d'internet depuis hier"));
        assert!(CLAIM.matches("j'en ai marre"));
    }

    #[test]
    fn digit_patterns_match() {
        assert!(URGENCY_HIGH.matches("coupe depuis 3 jours"));
        assert!(URGENCY_CRITICAL.matches("rien depuis 2 semaines"));
    }

    #[test]
    fn all_static_tables_compile() {
        for table in [
            &*CLAIM,
            &*RESOLUTION,
            &*URGENCY_CRITICAL,
            &*URGENCY_HIGH,
            &*URGENCY_MEDIUM,
        ] {
            let _ = table.score("");
        }
    }
}
