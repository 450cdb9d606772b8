//! Extraction of control tokens from raw text.
//!
//! Literal occurrences of a control token's display string are matched
//! before normalization and map straight to the token's id. This is what
//! makes unescaped delimiter text inside message content dangerous.

use ahash::AHashMap;
use regex::Regex;
use structok_core::{Result, TokenizerError};

/// A piece of input text after control-token extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'t> {
    /// A matched control token
    Control(u32),
    /// Ordinary text to be normalized and BPE-encoded
    Text(&'t str),
}

/// Matcher for the control tokens of a vocabulary.
#[derive(Debug, Clone, Default)]
pub struct AddedTokens {
    /// Alternation of all token strings, longest first
    pattern: Option<Regex>,
    /// Token string -> ID
    ids: AHashMap<String, u32>,
}

impl AddedTokens {
    /// Build a matcher over `(display string, id)` pairs.
    pub fn new<I, S>(tokens: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, u32)>,
        S: Into<String>,
    {
        let ids: AHashMap<String, u32> = tokens
            .into_iter()
            .map(|(token, id)| (token.into(), id))
            .filter(|(token, _)| !token.is_empty())
            .collect();
        if ids.is_empty() {
            return Ok(Self::default());
        }

        // Leftmost-first alternation: longer strings must come first
        let mut alternatives: Vec<&str> = ids.keys().map(String::as_str).collect();
        alternatives.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        let pattern = alternatives
            .iter()
            .map(|token| regex::escape(token))
            .collect::<Vec<_>>()
            .join("|");
        let pattern = Regex::new(&pattern).map_err(|e| {
            TokenizerError::InvalidConfig(format!("control token pattern: {}", e))
        })?;

        Ok(Self {
            pattern: Some(pattern),
            ids,
        })
    }

    /// Number of registered tokens.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Check if no tokens are registered.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Split text into control tokens and the text between them.
    pub fn segments<'t>(&self, text: &'t str) -> Vec<Segment<'t>> {
        let Some(pattern) = &self.pattern else {
            return if text.is_empty() {
                Vec::new()
            } else {
                vec![Segment::Text(text)]
            };
        };

        let mut segments = Vec::new();
        let mut last = 0;
        for m in pattern.find_iter(text) {
            if m.start() > last {
                segments.push(Segment::Text(&text[last..m.start()]));
            }
            // Every match is one of the registered keys
            if let Some(&id) = self.ids.get(m.as_str()) {
                segments.push(Segment::Control(id));
            }
            last = m.end();
        }
        if last < text.len() {
            segments.push(Segment::Text(&text[last..]));
        }
        segments
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher() -> AddedTokens {
        AddedTokens::new([("<|user|>", 1), ("<|assistant|>", 2), ("<|endoftext|>", 3)]).unwrap()
    }

    #[test]
    fn test_plain_text() {
        assert_eq!(matcher().segments("hello"), vec![Segment::Text("hello")]);
        assert!(matcher().segments("").is_empty());
    }

    #[test]
    fn test_extracts_control_tokens() {
        assert_eq!(
            matcher().segments("a<|user|>b<|endoftext|>"),
            vec![
                Segment::Text("a"),
                Segment::Control(1),
                Segment::Text("b"),
                Segment::Control(3),
            ]
        );
    }

    #[test]
    fn test_escaped_form_is_not_matched() {
        assert_eq!(
            matcher().segments("\\<|user|\\>"),
            vec![Segment::Text("\\<|user|\\>")]
        );
    }

    #[test]
    fn test_longest_match_wins() {
        let tokens = AddedTokens::new([("<|a|>", 1), ("<|a|><|b|>", 2)]).unwrap();
        assert_eq!(tokens.segments("<|a|><|b|>"), vec![Segment::Control(2)]);
    }

    #[test]
    fn test_empty_matcher() {
        let tokens = AddedTokens::new(Vec::<(String, u32)>::new()).unwrap();
        assert!(tokens.is_empty());
        assert_eq!(tokens.segments("x"), vec![Segment::Text("x")]);
    }
}
