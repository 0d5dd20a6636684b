// SPDX-FileCopyrightText: 2026 Triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Emoji handling.
//!
//! A small table maps the emoji that carry sentiment in operator feedback to
//! plain words the downstream matchers understand. Every other pictograph is
//! dropped.

/// Emoji with a textual replacement.
const EMOJI_WORDS: &[(&str, &str)] = &[
    ("😡", "angry"),
    ("😠", "angry"),
    ("🤬", "angry"),
    ("😤", "angry"),
    ("😢", "sad"),
    ("😭", "crying"),
    ("😞", "disappointed"),
    ("😩", "weary"),
    ("👎", "thumbs_down"),
    ("💔", "broken_heart"),
    ("👍", "thumbs_up"),
    ("😀", "smile"),
    ("😃", "smile"),
    ("😊", "smile"),
    ("🙂", "smile"),
    ("😍", "love"),
    ("❤", "love"),
    ("🙏", "thanks"),
    ("👏", "applause"),
    ("🎉", "celebration"),
    ("😂", "laughing"),
];

/// Replaces known emoji with ` word ` when `convert` is set, then removes
/// any remaining emoji code points.
pub fn replace_emoji(text: &str, convert: bool) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    'outer: while let Some(c) = rest.chars().next() {
        if convert && is_emoji(c) {
            for (symbol, word) in EMOJI_WORDS {
                if let Some(after) = rest.strip_prefix(symbol) {
                    out.push(' ');
                    out.push_str(word);
                    out.push(' ');
                    rest = after;
                    continue 'outer;
                }
            }
        }
        if !is_emoji(c) {
            out.push(c);
        }
        rest = &rest[c.len_utf8()..];
    }
    out
}

/// Whether `c` belongs to a pictographic or emoji-modifier block.
pub fn is_emoji(c: char) -> bool {
    matches!(
        c as u32,
        0x1F000..=0x1FAFF   // pictographs, emoticons, transport, flags, supplemental symbols
            | 0x2600..=0x27BF   // miscellaneous symbols and dingbats
            | 0x2B00..=0x2BFF   // arrows and stars
            | 0xFE0E..=0xFE0F   // variation selectors
            | 0x200D            // zero-width joiner
            | 0x20E3            // combining keycap
            | 0xE0020..=0xE007F // tag characters
    )
}
