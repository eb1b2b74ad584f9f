//! Text → animation unit classification.
//!
//! ## Precedence (per cursor position)
//!
//! ```text
//! 1. Digraph   two ASCII letters forming a known pair ("th", "ng", …) → 2 chars
//! 2. Emoji     code point inside one of the symbol blocks             → 1 char
//! 3. Letter    ASCII letter, lower-cased                              → 1 char
//! 4. Fallback  whitespace / ASCII punctuation / anything else         → 1 char
//! ```
//!
//! Word position is derived from maximal runs of ASCII letters computed once
//! over the whole input, so it never depends on where the cursor came from.

pub mod catalog;
pub mod timing;
pub mod tokenizer;

use serde::{Deserialize, Serialize};

/// Known two-letter units, checked in this order.
pub const DIGRAPHS: [&str; 10] = ["th", "sh", "ch", "qu", "oo", "ee", "ng", "wh", "ph", "gh"];

/// Code point blocks treated as emoji / symbols.
///
/// General punctuation (U+2000 block) and CJK symbols are included, so an
/// ellipsis or an ideographic full stop also drives an emotion.
const SYMBOL_RANGES: [(u32, u32); 6] = [
    (0x1F000, 0x1FFFF), // emoji blocks
    (0x2000, 0x2FFF),   // general punctuation, arrows, dingbats, misc symbols
    (0xFE00, 0xFEFF),   // variation selectors, presentation forms
    (0x200D, 0x200D),   // zero-width joiner
    (0x3000, 0x303F),   // CJK symbols and punctuation
    (0xE000, 0xF8FF),   // private use area
];

/// Closed set of unit kinds the timing model dispatches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitKind {
    /// Single ASCII letter.
    Letter,
    /// Two ASCII letters from [`DIGRAPHS`].
    Digraph,
    /// Emoji or symbol; drives the emotion channel instead of the mouth.
    Emoji,
    /// Any whitespace character, including newlines.
    Space,
    /// ASCII punctuation.
    Punctuation,
    /// Digits, non-ASCII letters and everything else.
    Other,
}

impl UnitKind {
    /// Whether units of this kind carry a character-derived viseme.
    pub fn is_articulated(self) -> bool {
        matches!(self, UnitKind::Letter | UnitKind::Digraph)
    }
}

/// Where a unit sits inside its letter run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WordPosition {
    First,
    Middle,
    Last,
}

/// Half-open `[start, end)` span of char indices covering one letter run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WordSpan {
    pub start: usize,
    pub end: usize,
}

impl WordSpan {
    fn contains(&self, index: usize) -> bool {
        index >= self.start && index < self.end
    }
}

/// A classified unit starting at some cursor position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Unit {
    pub kind: UnitKind,
    /// Number of chars the unit covers (1 or 2).
    pub len: usize,
}

/// Returns true for characters inside the emoji / symbol blocks.
pub fn is_symbol(c: char) -> bool {
    let code = c as u32;
    SYMBOL_RANGES
        .iter()
        .any(|&(lo, hi)| code >= lo && code <= hi)
}

/// Lower-cased digraph starting at `index`, if the next two chars form one.
pub fn digraph_at(chars: &[char], index: usize) -> Option<&'static str> {
    let (a, b) = match chars.get(index..index + 2) {
        Some(&[a, b]) => (a, b),
        _ => return None,
    };
    if !a.is_ascii_alphabetic() || !b.is_ascii_alphabetic() {
        return None;
    }
    let pair = [a.to_ascii_lowercase() as u8, b.to_ascii_lowercase() as u8];
    DIGRAPHS
        .iter()
        .copied()
        .find(|d| d.as_bytes() == &pair[..])
}

/// Classify the unit starting at `index`.
///
/// # Panics
/// Panics if `index` is out of bounds; callers drive the cursor.
pub fn classify_at(chars: &[char], index: usize) -> Unit {
    if digraph_at(chars, index).is_some() {
        return Unit {
            kind: UnitKind::Digraph,
            len: 2,
        };
    }

    let c = chars[index];
    let kind = if is_symbol(c) {
        UnitKind::Emoji
    } else if c.is_ascii_alphabetic() {
        UnitKind::Letter
    } else if c.is_whitespace() {
        UnitKind::Space
    } else if c.is_ascii_punctuation() {
        UnitKind::Punctuation
    } else {
        UnitKind::Other
    };

    Unit { kind, len: 1 }
}

/// Maximal runs of ASCII letters over the whole input.
pub fn word_spans(chars: &[char]) -> Vec<WordSpan> {
    let mut spans = Vec::new();
    let mut start: Option<usize> = None;

    for (i, c) in chars.iter().enumerate() {
        match (c.is_ascii_alphabetic(), start) {
            (true, None) => start = Some(i),
            (false, Some(s)) => {
                spans.push(WordSpan { start: s, end: i });
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        spans.push(WordSpan {
            start: s,
            end: chars.len(),
        });
    }

    spans
}

/// Position context for the unit `[start, start + len)`.
///
/// `First` wins over `Last`, so a one-letter word ("a", "I") counts as `First`.
/// Units outside every run have no position.
pub fn word_position(spans: &[WordSpan], start: usize, len: usize) -> Option<WordPosition> {
    // Spans are sorted and disjoint.
    let idx = spans.partition_point(|s| s.end <= start);
    let span = spans.get(idx).filter(|s| s.contains(start))?;

    if start == span.start {
        Some(WordPosition::First)
    } else if start + len == span.end {
        Some(WordPosition::Last)
    } else {
        Some(WordPosition::Middle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn digraph_is_case_insensitive() {
        assert_eq!(digraph_at(&chars("THe"), 0), Some("th"));
        assert_eq!(digraph_at(&chars("sHip"), 0), Some("sh"));
        assert_eq!(digraph_at(&chars("ab"), 0), None);
    }

    #[test]
    fn digraph_needs_two_letters() {
        assert_eq!(digraph_at(&chars("t"), 0), None);
        assert_eq!(digraph_at(&chars("t h"), 0), None);
        assert_eq!(digraph_at(&chars("t1"), 0), None);
    }

    #[test]
    fn symbol_ranges_cover_emoji_and_joiners() {
        assert!(is_symbol('😊'));
        assert!(is_symbol('\u{200D}'));
        assert!(is_symbol('\u{FE0F}'));
        assert!(is_symbol('…'));
        assert!(is_symbol('、'));
        assert!(!is_symbol('a'));
        assert!(!is_symbol('é'));
        assert!(!is_symbol('.'));
    }

    #[test]
    fn classify_fallbacks() {
        let input = chars("a 1.é\n");
        assert_eq!(classify_at(&input, 0).kind, UnitKind::Letter);
        assert_eq!(classify_at(&input, 1).kind, UnitKind::Space);
        assert_eq!(classify_at(&input, 2).kind, UnitKind::Other);
        assert_eq!(classify_at(&input, 3).kind, UnitKind::Punctuation);
        assert_eq!(classify_at(&input, 4).kind, UnitKind::Other);
        assert_eq!(classify_at(&input, 5).kind, UnitKind::Space);
    }

    #[test]
    fn classify_prefers_digraph() {
        let unit = classify_at(&chars("ng"), 0);
        assert_eq!(unit.kind, UnitKind::Digraph);
        assert_eq!(unit.len, 2);
    }

    #[test]
    fn spans_split_on_non_letters() {
        let spans = word_spans(&chars("hi, you2x"));
        assert_eq!(
            spans,
            vec![
                WordSpan { start: 0, end: 2 },
                WordSpan { start: 4, end: 7 },
                WordSpan { start: 8, end: 9 },
            ]
        );
    }

    #[test]
    fn positions_inside_a_word() {
        let input = chars("cat");
        let spans = word_spans(&input);
        assert_eq!(word_position(&spans, 0, 1), Some(WordPosition::First));
        assert_eq!(word_position(&spans, 1, 1), Some(WordPosition::Middle));
        assert_eq!(word_position(&spans, 2, 1), Some(WordPosition::Last));
    }

    #[test]
    fn digraph_at_word_end_is_last() {
        let input = chars("bath");
        let spans = word_spans(&input);
        assert_eq!(word_position(&spans, 2, 2), Some(WordPosition::Last));
    }

    #[test]
    fn single_letter_word_is_first() {
        let input = chars("a b");
        let spans = word_spans(&input);
        assert_eq!(word_position(&spans, 0, 1), Some(WordPosition::First));
        assert_eq!(word_position(&spans, 1, 1), None);
        assert_eq!(word_position(&spans, 2, 1), Some(WordPosition::First));
    }
}
