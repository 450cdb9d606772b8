//! Text splitting for pre-tokenization.
//!
//! BPE merges never cross a split boundary. The GPT-2 pattern separates
//! contractions, letter runs, digit runs and punctuation runs, each
//! optionally preceded by a single space.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// The GPT-2 pattern without its `\s+(?!\S)` lookahead branch, which
/// `Splitter::split` emulates.
const GPT2_PATTERN: &str =
    r"'s|'t|'re|'ve|'m|'ll|'d| ?\p{L}+| ?\p{N}+| ?[^\s\p{L}\p{N}]+|\s+";

fn gpt2_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(GPT2_PATTERN).expect("GPT-2 split pattern is valid"))
}

/// Splitting patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitPattern {
    /// No splitting (keep text as-is)
    NoSplit,
    /// GPT-2 byte-level pre-tokenization
    #[default]
    Gpt2,
}

/// Text splitter for pre-tokenization.
#[derive(Debug, Clone, Copy, Default)]
pub struct Splitter {
    /// Pattern to split on
    pattern: SplitPattern,
}

impl Splitter {
    /// Create a new splitter.
    pub fn new(pattern: SplitPattern) -> Self {
        Self { pattern }
    }

    /// Create a GPT-2 splitter.
    pub fn gpt2() -> Self {
        Self::new(SplitPattern::Gpt2)
    }

    /// The configured pattern.
    pub fn pattern(&self) -> SplitPattern {
        self.pattern
    }

    /// Split text into chunks. Concatenating the chunks yields `text`.
    pub fn split<'t>(&self, text: &'t str) -> Vec<&'t str> {
        match self.pattern {
            SplitPattern::NoSplit if text.is_empty() => Vec::new(),
            SplitPattern::NoSplit => vec![text],
            SplitPattern::Gpt2 => split_gpt2(text),
        }
    }
}

fn split_gpt2(text: &str) -> Vec<&str> {
    let re = gpt2_regex();
    let mut pieces = Vec::new();
    let mut pos = 0;

    while pos < text.len() {
        let Some(m) = re.find_at(text, pos) else {
            break;
        };
        let mut end = m.end();
        let piece = m.as_str();

        // A whitespace run followed by non-whitespace gives up its last
        // character, which then prefixes the next piece.
        if end < text.len() && piece.chars().all(char::is_whitespace) {
            if let Some((last, _)) = piece.char_indices().last() {
                if last > 0 {
                    end = m.start() + last;
                }
            }
        }

        pieces.push(&text[m.start()..end]);
        pos = end;
    }

    pieces
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gpt2_words_and_punctuation() {
        let splitter = Splitter::gpt2();
        assert_eq!(
            splitter.split("Hello, world!"),
            vec!["Hello", ",", " world", "!"]
        );
    }

    #[test]
    fn test_gpt2_contractions_and_digits() {
        let splitter = Splitter::gpt2();
        assert_eq!(
            splitter.split("I'm 42 today"),
            vec!["I", "'m", " 42", " today"]
        );
    }

    #[test]
    fn test_gpt2_whitespace_runs() {
        let splitter = Splitter::gpt2();
        assert_eq!(splitter.split("a   b"), vec!["a", "  ", " b"]);
        assert_eq!(splitter.split("end  "), vec!["end", "  "]);
        assert_eq!(splitter.split("x\n\ny"), vec!["x", "\n", "\n", "y"]);
    }

    #[test]
    fn test_gpt2_escaped_delimiter() {
        let splitter = Splitter::gpt2();
        assert_eq!(
            splitter.split("say \\<|user|\\>"),
            vec!["say", " \\<|", "user", "|\\>"]
        );
    }

    #[test]
    fn test_split_is_lossless() {
        let splitter = Splitter::gpt2();
        let text = "  Tabs\tand  spaces,\n numbers 3.14 and ünïcødé!  ";
        assert_eq!(splitter.split(text).concat(), text);
    }

    #[test]
    fn test_nosplit() {
        let splitter = Splitter::new(SplitPattern::NoSplit);
        assert_eq!(splitter.split("hello world"), vec!["hello world"]);
        assert!(splitter.split("").is_empty());
    }
}
