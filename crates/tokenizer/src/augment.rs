//! Vocabulary augmentation with reserved control tokens.
//!
//! An existing byte-level vocabulary (GPT-2 style, dense ids `[0, N)`) is
//! rewritten so that the control tokens occupy ids `0..k`. Every other token
//! keeps its relative order, shifted up by `k`. The final source slot `N - 1`
//! is the legacy end-of-text slot: it is folded into the reserved block, which
//! keeps the result dense over `[0, k + N - 1)`. Merge rules are strings and
//! pass through untouched.

use std::collections::HashMap;
use structok_core::{check_dense_ids, ControlToken, Result, TokenizerError};
use tracing::{debug, info};

/// A vocabulary as shipped by an upstream model, before augmentation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceVocabulary {
    /// Token string -> ID
    pub vocab: HashMap<String, u32>,
    /// Merge rules in rank order
    pub merges: Vec<(String, String)>,
}

/// A vocabulary with control tokens reserved at the lowest ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AugmentedVocabulary {
    /// Token string -> ID, control tokens included
    pub vocab: HashMap<String, u32>,
    /// Merge rules in rank order
    pub merges: Vec<(String, String)>,
    /// Control tokens with their IDs
    pub control: Vec<(ControlToken, u32)>,
}

impl AugmentedVocabulary {
    /// Number of tokens, control tokens included.
    pub fn len(&self) -> usize {
        self.vocab.len()
    }

    /// Check if the vocabulary is empty.
    pub fn is_empty(&self) -> bool {
        self.vocab.is_empty()
    }

    /// Get the ID for a token string.
    pub fn get_id(&self, token: &str) -> Option<u32> {
        self.vocab.get(token).copied()
    }

    /// Get the ID assigned to a control token.
    pub fn control_id(&self, token: ControlToken) -> Option<u32> {
        self.control
            .iter()
            .find(|(control, _)| *control == token)
            .map(|&(_, id)| id)
    }

    /// Tokens ordered by ID.
    ///
    /// Only meaningful once [`check_contiguous`](Self::check_contiguous)
    /// has passed.
    pub fn tokens_by_id(&self) -> Vec<&str> {
        let mut entries: Vec<(&str, u32)> =
            self.vocab.iter().map(|(t, &id)| (t.as_str(), id)).collect();
        entries.sort_by_key(|&(_, id)| id);
        entries.into_iter().map(|(t, _)| t).collect()
    }

    /// Verify that IDs cover `[0, len)` exactly once and that every control
    /// token entry agrees with the vocabulary.
    pub fn check_contiguous(&self) -> Result<()> {
        check_dense_ids(
            self.vocab.iter().map(|(t, &id)| (t.as_str(), id)),
            self.vocab.len(),
        )?;
        for &(token, id) in &self.control {
            if self.get_id(token.as_str()) != Some(id) {
                return Err(TokenizerError::InvalidConfig(format!(
                    "control token {} recorded at id {} but the vocabulary disagrees",
                    token, id
                )));
            }
        }
        Ok(())
    }
}

/// Reserve the control-token block at the front of `source`.
///
/// Fails if the source ids are not dense, if a reserved string appears
/// anywhere but the folded final slot, or if the final slot holds an
/// ordinary token.
pub fn augment(source: &SourceVocabulary) -> Result<AugmentedVocabulary> {
    check_source_dense(&source.vocab)?;

    let reserved = ControlToken::RESERVED;
    let k = reserved.len() as u32;
    let folded_slot = source.vocab.len() as u32 - 1;

    let mut vocab = HashMap::with_capacity(source.vocab.len() + reserved.len() - 1);
    let control: Vec<(ControlToken, u32)> = reserved
        .iter()
        .enumerate()
        .map(|(id, &token)| (token, id as u32))
        .collect();
    for &(token, id) in &control {
        vocab.insert(token.as_str().to_string(), id);
    }

    for (token, &id) in &source.vocab {
        let is_reserved = ControlToken::from_display(token).is_some();
        if id == folded_slot {
            if is_reserved {
                debug!(token = %token, id, "folding legacy final slot into reserved block");
                continue;
            }
            return Err(TokenizerError::FoldedSlot {
                token: token.clone(),
                id,
            });
        }
        if is_reserved {
            return Err(TokenizerError::ReservedTokenCollision {
                token: token.clone(),
                id,
            });
        }
        // Every kept id lies below the folded slot
        vocab.insert(token.clone(), id + k);
    }

    let augmented = AugmentedVocabulary {
        vocab,
        merges: source.merges.clone(),
        control,
    };
    augmented.check_contiguous()?;

    info!(
        source_size = source.vocab.len(),
        size = augmented.len(),
        reserved = k,
        merges = augmented.merges.len(),
        "augmented vocabulary"
    );
    Ok(augmented)
}

/// Check that the IDs of `vocab` are exactly `[0, len)` and that it is not empty.
fn check_source_dense(vocab: &HashMap<String, u32>) -> Result<()> {
    if vocab.is_empty() {
        return Err(TokenizerError::VocabularyNotDense {
            size: 0,
            detail: "vocabulary is empty".to_string(),
        });
    }
    check_dense_ids(vocab.iter().map(|(t, &id)| (t.as_str(), id)), vocab.len())
}
