//! Per-unit hold durations.
//!
//! ## Algorithm
//!
//! 1. Base timing from the articulatory class of the unit.
//! 2. Visual distinctiveness of the primary char: round shapes (`o w u`) hold
//!    longer, subtle ones (`t d`) shorter.
//! 3. Word position: first letter +50 ms, last letter +30 ms.
//! 4. Punctuation / whitespace multiplier on the running value.
//!
//! Emoji units skip all of this and use a fixed pause.

use super::{UnitKind, WordPosition};

/// Fixed hold for emoji / symbol units.
pub const EMOJI_PAUSE_MS: u64 = 250;

/// Articulatory class driving the base timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArticulationClass {
    Vowel,
    Liquid,
    Nasal,
    Fricative,
    Stop,
    Neutral,
}

impl ArticulationClass {
    /// Class of a lower-cased unit: digraphs first, then the primary char.
    pub fn of(unit: &str) -> Self {
        match unit {
            "ng" => return Self::Nasal,
            "th" | "sh" | "wh" | "ph" | "gh" => return Self::Fricative,
            "ch" => return Self::Stop,
            _ => {}
        }
        match unit.chars().next() {
            Some('a' | 'e' | 'i' | 'o' | 'u' | 'y') => Self::Vowel,
            Some('l' | 'r') => Self::Liquid,
            Some('m' | 'n') => Self::Nasal,
            Some('f' | 'v' | 's' | 'z' | 'h') => Self::Fricative,
            Some('p' | 'b' | 't' | 'd' | 'k' | 'g') => Self::Stop,
            _ => Self::Neutral,
        }
    }

    pub fn base_ms(self) -> i64 {
        match self {
            Self::Vowel => 250,
            Self::Liquid => 180,
            Self::Nasal => 150,
            Self::Fricative => 120,
            Self::Stop => 80,
            Self::Neutral => 100,
        }
    }
}

fn distinctiveness_ms(primary: char) -> i64 {
    match primary {
        'o' | 'w' | 'u' => 50,
        't' | 'd' => -20,
        _ => 0,
    }
}

fn position_ms(position: Option<WordPosition>) -> i64 {
    match position {
        Some(WordPosition::First) => 50,
        Some(WordPosition::Last) => 30,
        Some(WordPosition::Middle) | None => 0,
    }
}

fn punctuation_multiplier(c: char) -> f64 {
    match c {
        '.' | '!' | '?' => 3.0,
        ',' | ';' | ':' | '\n' => 2.0,
        ' ' => 0.4,
        _ => 1.0,
    }
}

/// Hold duration in milliseconds for one unit.
///
/// `unit` is the raw text of the unit (one char, or two for a digraph); case
/// does not matter.
pub fn hold_ms(unit: &str, kind: UnitKind, position: Option<WordPosition>) -> u64 {
    let lower = unit.to_ascii_lowercase();
    let Some(primary) = lower.chars().next() else {
        return 0;
    };

    let class = match kind {
        UnitKind::Emoji => return EMOJI_PAUSE_MS,
        UnitKind::Letter | UnitKind::Digraph => ArticulationClass::of(&lower),
        UnitKind::Space | UnitKind::Punctuation | UnitKind::Other => ArticulationClass::Neutral,
    };

    let adjusted = class.base_ms() + distinctiveness_ms(primary) + position_ms(position);
    let scaled = adjusted as f64 * punctuation_multiplier(primary);

    scaled.round().max(0.0) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_classes() {
        assert_eq!(hold_ms("a", UnitKind::Letter, None), 250);
        assert_eq!(hold_ms("l", UnitKind::Letter, None), 180);
        assert_eq!(hold_ms("m", UnitKind::Letter, None), 150);
        assert_eq!(hold_ms("f", UnitKind::Letter, None), 120);
        assert_eq!(hold_ms("p", UnitKind::Letter, None), 80);
        assert_eq!(hold_ms("x", UnitKind::Letter, None), 100);
    }

    #[test]
    fn uppercase_matches_lowercase() {
        assert_eq!(
            hold_ms("R", UnitKind::Letter, Some(WordPosition::First)),
            hold_ms("r", UnitKind::Letter, Some(WordPosition::First))
        );
    }

    #[test]
    fn round_shapes_hold_longer() {
        // vowel 250 + round 50
        assert_eq!(hold_ms("o", UnitKind::Letter, None), 300);
        // neutral 100 + round 50
        assert_eq!(hold_ms("w", UnitKind::Letter, None), 150);
    }

    #[test]
    fn subtle_shapes_are_shorter() {
        assert_eq!(hold_ms("t", UnitKind::Letter, None), 60);
        assert_eq!(hold_ms("d", UnitKind::Letter, None), 60);
    }

    #[test]
    fn position_bonus() {
        let middle = hold_ms("c", UnitKind::Letter, Some(WordPosition::Middle));
        let first = hold_ms("c", UnitKind::Letter, Some(WordPosition::First));
        let last = hold_ms("c", UnitKind::Letter, Some(WordPosition::Last));
        assert_eq!(first, middle + 50);
        assert_eq!(last, middle + 30);
    }

    #[test]
    fn digraph_classes() {
        assert_eq!(hold_ms("ng", UnitKind::Digraph, None), 150);
        assert_eq!(hold_ms("sh", UnitKind::Digraph, None), 120);
        assert_eq!(hold_ms("ch", UnitKind::Digraph, None), 80);
        // fricative 120, primary 't' is subtle
        assert_eq!(hold_ms("th", UnitKind::Digraph, None), 100);
        // fricative 120, primary 'w' is round
        assert_eq!(hold_ms("wh", UnitKind::Digraph, None), 170);
        // not in the table: falls back to the primary char
        assert_eq!(hold_ms("oo", UnitKind::Digraph, None), 300);
        assert_eq!(hold_ms("qu", UnitKind::Digraph, None), 100);
    }

    #[test]
    fn punctuation_scaling() {
        assert_eq!(hold_ms(".", UnitKind::Punctuation, None), 300);
        assert_eq!(hold_ms("!", UnitKind::Punctuation, None), 300);
        assert_eq!(hold_ms("?", UnitKind::Punctuation, None), 300);
        assert_eq!(hold_ms(",", UnitKind::Punctuation, None), 200);
        assert_eq!(hold_ms(";", UnitKind::Punctuation, None), 200);
        assert_eq!(hold_ms(":", UnitKind::Punctuation, None), 200);
        assert_eq!(hold_ms("\n", UnitKind::Space, None), 200);
        assert_eq!(hold_ms(" ", UnitKind::Space, None), 40);
        assert_eq!(hold_ms("-", UnitKind::Punctuation, None), 100);
        assert_eq!(hold_ms("\t", UnitKind::Space, None), 100);
    }

    #[test]
    fn emoji_uses_fixed_pause() {
        assert_eq!(
            hold_ms("😊", UnitKind::Emoji, Some(WordPosition::First)),
            EMOJI_PAUSE_MS
        );
    }

    #[test]
    fn other_characters_use_default() {
        assert_eq!(hold_ms("7", UnitKind::Other, None), 100);
        assert_eq!(hold_ms("é", UnitKind::Other, None), 100);
    }
}
