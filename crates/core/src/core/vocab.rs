//! Vocabulary storage and lookup.
//!
//! Tokens are kept in an `AHashMap` keyed by `CompactString`, with a reverse
//! map for decoding. Control token ids are cached separately so the hot
//! paths never need a string lookup.

use super::control::ControlToken;
use crate::error::{Result, TokenizerError};
use ahash::AHashMap;
use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// Forward mapping: token string -> ID
pub type Vocab = AHashMap<CompactString, u32>;

/// Reverse mapping: ID -> token string
pub type VocabR = AHashMap<u32, CompactString>;

/// Vocabulary with forward and reverse mappings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vocabulary {
    /// Forward mapping: token string -> ID
    pub vocab: Vocab,
    /// Reverse mapping: ID -> token string
    pub vocab_r: VocabR,
    /// Control token IDs (cached for fast access)
    pub control: ControlTokens,
}

impl Vocabulary {
    /// Create a new empty vocabulary.
    pub fn new() -> Self {
        Self {
            vocab: Vocab::new(),
            vocab_r: VocabR::new(),
            control: ControlTokens::default(),
        }
    }

    /// Create a new vocabulary with capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            vocab: Vocab::with_capacity(capacity),
            vocab_r: VocabR::with_capacity(capacity),
            control: ControlTokens::default(),
        }
    }

    /// Add a token at the next free ID.
    ///
    /// Returns the existing ID if the token is already present.
    pub fn add_token(&mut self, token: &str) -> Result<u32> {
        if let Some(&id) = self.vocab.get(token) {
            return Ok(id);
        }

        let id = self.vocab.len() as u32;
        self.add_token_with_id(token, id)?;
        Ok(id)
    }

    /// Add a token with a specific ID.
    ///
    /// Fails if either the ID or the token string is already taken.
    pub fn add_token_with_id(&mut self, token: &str, id: u32) -> Result<()> {
        if let Some(existing) = self.vocab_r.get(&id) {
            return Err(TokenizerError::InvalidConfig(format!(
                "Token ID {} already assigned to {:?}",
                id, existing
            )));
        }
        if let Some(&existing) = self.vocab.get(token) {
            return Err(TokenizerError::InvalidConfig(format!(
                "Token {:?} already assigned to ID {}",
                token, existing
            )));
        }

        if let Some(control) = ControlToken::from_display(token) {
            self.control.set(control, id);
        }

        let token = CompactString::new(token);
        self.vocab_r.insert(id, token.clone());
        self.vocab.insert(token, id);

        Ok(())
    }

    /// Get the ID for a token string.
    #[inline]
    pub fn get_id(&self, token: &str) -> Option<u32> {
        self.vocab.get(token).copied()
    }

    /// Get the token string for an ID.
    #[inline]
    pub fn get_token(&self, id: u32) -> Option<&str> {
        self.vocab_r.get(&id).map(|s| s.as_str())
    }

    /// Get the size of the vocabulary.
    #[inline]
    pub fn len(&self) -> usize {
        self.vocab.len()
    }

    /// Check if the vocabulary is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vocab.is_empty()
    }

    /// Verify that IDs cover `[0, len)` exactly once.
    pub fn check_dense(&self) -> Result<()> {
        check_dense_ids(
            self.vocab.iter().map(|(token, &id)| (token.as_str(), id)),
            self.vocab.len(),
        )
    }
}

/// Check that `entries` assign every ID in `[0, size)` to exactly one token.
///
/// An empty set of entries with `size == 0` is dense.
pub fn check_dense_ids<'a, I>(entries: I, size: usize) -> Result<()>
where
    I: IntoIterator<Item = (&'a str, u32)>,
{
    let mut owners: Vec<Option<&str>> = vec![None; size];
    for (token, id) in entries {
        let slot = owners.get_mut(id as usize).ok_or_else(|| {
            TokenizerError::VocabularyNotDense {
                size,
                detail: format!("token {:?} has out-of-range id {}", token, id),
            }
        })?;
        if let Some(previous) = slot.replace(token) {
            return Err(TokenizerError::VocabularyNotDense {
                size,
                detail: format!("id {} shared by {:?} and {:?}", id, previous, token),
            });
        }
    }

    if let Some(missing) = owners.iter().position(Option::is_none) {
        return Err(TokenizerError::VocabularyNotDense {
            size,
            detail: format!("id {} is unassigned", missing),
        });
    }
    Ok(())
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self::new()
    }
}

/// Control token IDs cached for fast access.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlTokens {
    /// Padding token ID
    pub pad: Option<u32>,
    /// User role token ID
    pub user: Option<u32>,
    /// Assistant role token ID
    pub assistant: Option<u32>,
    /// End-of-text token ID
    pub eot: Option<u32>,
}

impl ControlTokens {
    /// Get the cached ID for a control token.
    #[inline]
    pub fn get(&self, token: ControlToken) -> Option<u32> {
        match token {
            ControlToken::Padding => self.pad,
            ControlToken::User => self.user,
            ControlToken::Assistant => self.assistant,
            ControlToken::EndOfText => self.eot,
        }
    }

    /// Record the ID of a control token.
    pub fn set(&mut self, token: ControlToken, id: u32) {
        match token {
            ControlToken::Padding => self.pad = Some(id),
            ControlToken::User => self.user = Some(id),
            ControlToken::Assistant => self.assistant = Some(id),
            ControlToken::EndOfText => self.eot = Some(id),
        }
    }

    /// Check if an ID is a control token.
    #[inline]
    pub fn is_control(&self, id: u32) -> bool {
        self.lookup(id).is_some()
    }

    /// Resolve an ID back to its control token.
    pub fn lookup(&self, id: u32) -> Option<ControlToken> {
        ControlToken::RESERVED
            .into_iter()
            .find(|&token| self.get(token) == Some(id))
    }

    /// Iterate over the control tokens that have an ID.
    pub fn iter(&self) -> impl Iterator<Item = (ControlToken, u32)> + '_ {
        ControlToken::RESERVED
            .into_iter()
            .filter_map(|token| self.get(token).map(|id| (token, id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_token() {
        let mut vocab = Vocabulary::new();
        let id1 = vocab.add_token("hello").unwrap();
        let id2 = vocab.add_token("world").unwrap();

        assert_eq!(id1, 0);
        assert_eq!(id2, 1);
        assert_eq!(vocab.get_id("world"), Some(1));
        assert_eq!(vocab.get_token(0), Some("hello"));
    }

    #[test]
    fn test_add_duplicate_token() {
        let mut vocab = Vocabulary::new();
        let id1 = vocab.add_token("hello").unwrap();
        let id2 = vocab.add_token("hello").unwrap();

        assert_eq!(id1, id2);
        assert_eq!(vocab.len(), 1);
    }

    #[test]
    fn test_add_token_with_taken_id() {
        let mut vocab = Vocabulary::new();
        vocab.add_token_with_id("hello", 5).unwrap();

        assert!(vocab.add_token_with_id("world", 5).is_err());
        assert!(vocab.add_token_with_id("hello", 6).is_err());
        assert_eq!(vocab.len(), 1);
    }

    #[test]
    fn test_control_tokens_are_cached() {
        let mut vocab = Vocabulary::new();
        for (id, token) in ControlToken::RESERVED.into_iter().enumerate() {
            vocab.add_token_with_id(token.as_str(), id as u32).unwrap();
        }
        // Plain insertion of a display string is recognised as well.
        let mut other = Vocabulary::new();
        other.add_token_with_id("<|user|>", 7).unwrap();

        assert_eq!(vocab.control.user, Some(1));
        assert_eq!(vocab.control.eot, Some(3));
        assert_eq!(vocab.control.lookup(2), Some(ControlToken::Assistant));
        assert!(!vocab.control.is_control(4));
        assert_eq!(other.control.get(ControlToken::User), Some(7));
    }

    #[test]
    fn test_check_dense() {
        let mut vocab = Vocabulary::new();
        vocab.add_token_with_id("a", 0).unwrap();
        vocab.add_token_with_id("b", 1).unwrap();
        assert!(vocab.check_dense().is_ok());

        vocab.add_token_with_id("d", 3).unwrap();
        let err = vocab.check_dense().unwrap_err();
        assert!(matches!(err, TokenizerError::VocabularyNotDense { size: 3, .. }));
    }

    #[test]
    fn test_check_dense_ids() {
        assert!(check_dense_ids([("a", 1), ("b", 0)], 2).is_ok());
        assert!(check_dense_ids(std::iter::empty::<(&str, u32)>(), 0).is_ok());

        let shared = check_dense_ids([("a", 0), ("b", 0)], 2).unwrap_err();
        assert!(shared.to_string().contains("shared by"));
        let out_of_range = check_dense_ids([("a", 0), ("b", 5)], 2).unwrap_err();
        assert!(out_of_range.to_string().contains("out-of-range"));
        let missing = check_dense_ids([("a", 0)], 2).unwrap_err();
        assert!(missing.to_string().contains("id 1 is unassigned"));
    }
}
