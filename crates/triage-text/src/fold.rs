// SPDX-FileCopyrightText: 2026 Triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Accent folding.

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Lowercases `text` and strips diacritics (`Réseau` becomes `reseau`).
///
/// Uses NFKD decomposition, so compatibility characters such as ligatures
/// and full-width letters are folded as well.
pub fn fold(text: &str) -> String {
    text.nfkd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_french_accents() {
        assert_eq!(fold("Réseau coupé, débit à zéro"), "reseau coupe, debit a zero");
    }

    #[test]
    fn folds_ligatures_and_case() {
        assert_eq!(fold("ÉTÉ ﬁbre"), "ete fibre");
    }

    #[test]
    fn ascii_is_only_lowercased() {
        assert_eq!(fold("Plus De Reseau"), "plus de reseau");
    }
}
