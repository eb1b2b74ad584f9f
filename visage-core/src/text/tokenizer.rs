//! Text → ordered animation tokens.
//!
//! Tokenization is total and lossless: every input char lands in exactly one
//! token, so concatenating `Token::text` in order rebuilds the input.

use serde::{Deserialize, Serialize};

use super::catalog::VisemeCatalog;
use super::timing::{self, EMOJI_PAUSE_MS};
use super::{classify_at, digraph_at, word_position, word_spans, UnitKind, WordPosition};

/// One animation step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    /// Slice of the input this token covers (two chars only for digraphs).
    pub text: String,
    pub kind: UnitKind,
    /// Position inside the surrounding letter run, if any.
    pub position: Option<WordPosition>,
    /// Mouth shape to show. Non-articulated units carry the neutral shape.
    pub viseme: String,
    /// Emotion id; only set for emoji / symbol units.
    pub emotion: Option<String>,
    /// How long to display this token before advancing.
    pub hold_ms: u64,
}

/// Configurable tokenizer. `Tokenizer::default()` matches [`tokenize`].
#[derive(Debug, Clone)]
pub struct Tokenizer {
    catalog: VisemeCatalog,
    emoji_pause_ms: u64,
}

impl Tokenizer {
    pub fn new(catalog: VisemeCatalog, emoji_pause_ms: u64) -> Self {
        Self {
            catalog,
            emoji_pause_ms,
        }
    }

    pub fn catalog(&self) -> &VisemeCatalog {
        &self.catalog
    }

    pub fn tokenize(&self, text: &str) -> Vec<Token> {
        let chars: Vec<char> = text.chars().collect();
        let spans = word_spans(&chars);
        let mut tokens = Vec::with_capacity(chars.len());
        let mut i = 0;

        while i < chars.len() {
            let unit = classify_at(&chars, i);
            let slice: String = chars[i..i + unit.len].iter().collect();

            let token = match unit.kind {
                UnitKind::Emoji => Token {
                    emotion: Some(slice.clone()),
                    text: slice,
                    kind: unit.kind,
                    position: None,
                    viseme: self.catalog.neutral().to_string(),
                    hold_ms: self.emoji_pause_ms,
                },
                UnitKind::Digraph | UnitKind::Letter => {
                    let id = match digraph_at(&chars, i) {
                        Some(digraph) if unit.kind == UnitKind::Digraph => digraph.to_string(),
                        _ => slice.to_ascii_lowercase(),
                    };
                    let position = word_position(&spans, i, unit.len);
                    Token {
                        viseme: self.catalog.resolve(&id).to_string(),
                        hold_ms: timing::hold_ms(&slice, unit.kind, position),
                        text: slice,
                        kind: unit.kind,
                        position,
                        emotion: None,
                    }
                }
                UnitKind::Space | UnitKind::Punctuation | UnitKind::Other => Token {
                    viseme: self.catalog.neutral().to_string(),
                    hold_ms: timing::hold_ms(&slice, unit.kind, None),
                    text: slice,
                    kind: unit.kind,
                    position: None,
                    emotion: None,
                },
            };

            tokens.push(token);
            i += unit.len;
        }

        tokens
    }
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new(VisemeCatalog::default(), EMOJI_PAUSE_MS)
    }
}

/// Tokenize with the default catalog and emoji pause.
pub fn tokenize(text: &str) -> Vec<Token> {
    Tokenizer::default().tokenize(text)
}

/// Sum of all hold durations, i.e. the minimum playback time of `tokens`.
pub fn total_hold_ms(tokens: &[Token]) -> u64 {
    tokens.iter().map(|t| t.hold_ms).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(tokens: &[Token]) -> Vec<&str> {
        tokens.iter().map(|t| t.text.as_str()).collect()
    }

    #[test]
    fn digraph_takes_precedence() {
        let tokens = tokenize("the");
        assert_eq!(texts(&tokens), vec!["th", "e"]);
        assert_eq!(tokens[0].viseme, "th");
        assert_eq!(tokens[0].kind, UnitKind::Digraph);
        assert_eq!(tokens[0].position, Some(WordPosition::First));
        assert_eq!(tokens[1].position, Some(WordPosition::Last));
    }

    #[test]
    fn emoji_is_isolated() {
        let tokens = tokenize("a😊b");
        assert_eq!(tokens.len(), 3);
        let emoji = &tokens[1];
        assert_eq!(emoji.text, "😊");
        assert_eq!(emoji.emotion.as_deref(), Some("😊"));
        assert_eq!(emoji.hold_ms, 250);
        assert_eq!(emoji.viseme, "ee");
        assert!(tokens[0].emotion.is_none());
        assert!(tokens[2].emotion.is_none());
    }

    #[test]
    fn lossless_over_mixed_input() {
        let inputs = [
            "",
            "Hello, world!",
            "THE QUICK brown fox\njumps",
            "naïve café ☕ — 你好。",
            "👨\u{200D}👩\u{200D}👧 family",
            "a\tb  c...",
            "x",
        ];
        for input in inputs {
            let rebuilt: String = tokenize(input).into_iter().map(|t| t.text).collect();
            assert_eq!(rebuilt, input);
        }
    }

    #[test]
    fn deterministic() {
        let input = "Should I stay or should I go? 🤔";
        assert_eq!(tokenize(input), tokenize(input));
    }

    #[test]
    fn letters_are_lowercased() {
        let tokens = tokenize("Hi");
        assert_eq!(tokens[0].viseme, "h");
        assert_eq!(tokens[0].text, "H");
        assert_eq!(tokens[1].viseme, "i");
    }

    #[test]
    fn non_letters_use_neutral() {
        let tokens = tokenize("4 .");
        assert!(tokens.iter().all(|t| t.viseme == "ee"));
        assert_eq!(tokens[1].hold_ms, 40);
        assert_eq!(tokens[2].hold_ms, 300);
    }

    #[test]
    fn word_first_letter_holds_longer() {
        let cat = tokenize("cat");
        let scat = tokenize("scat");
        // "sc" is not a digraph, so 'c' sits in the middle of "scat"
        assert_eq!(scat[1].text, "c");
        assert_eq!(scat[1].position, Some(WordPosition::Middle));
        assert_eq!(cat[0].hold_ms, scat[1].hold_ms + 50);
    }

    #[test]
    fn digraph_spanning_words_is_not_joined() {
        // letters separated by a space never pair up
        let tokens = tokenize("at home");
        assert_eq!(texts(&tokens), vec!["a", "t", " ", "h", "o", "m", "e"]);
    }

    #[test]
    fn catalog_restricts_visemes() {
        let catalog = VisemeCatalog::new("rest", ["a", "rest"]).unwrap();
        let tokenizer = Tokenizer::new(catalog, 400);
        let tokens = tokenizer.tokenize("ab😀");
        assert_eq!(tokens[0].viseme, "a");
        assert_eq!(tokens[1].viseme, "rest");
        assert_eq!(tokens[2].viseme, "rest");
        assert_eq!(tokens[2].hold_ms, 400);
    }

    #[test]
    fn total_hold_sums_tokens() {
        let tokens = tokenize("no");
        // 'n' first: 150 + 50, 'o' last: 250 + 50 + 30
        assert_eq!(total_hold_ms(&tokens), 200 + 330);
    }
}
