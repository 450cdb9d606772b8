//! Merge rule management for BPE.
//!
//! Merge rules are stored using token IDs rather than strings for fast
//! comparison. The rank of a rule is its position in the merges file.

use super::vocab::Vocabulary;
use crate::error::{Result, TokenizerError};
use ahash::AHashMap;
use serde::{Deserialize, Serialize};

/// A pair of token IDs that can be merged.
pub type Pair = (u32, u32);

/// Merge rule mapping: pair -> (rank, new_token_id).
///
/// Lower rank = higher priority.
pub type MergeMap = AHashMap<Pair, (u32, u32)>;

/// Collection of BPE merge rules with efficient lookup.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MergeRules {
    /// Merge rules: pair -> (rank, new_token_id)
    pub merges: MergeMap,
}

impl MergeRules {
    /// Create a new empty collection of merge rules.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new collection with capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            merges: MergeMap::with_capacity(capacity),
        }
    }

    /// Add a merge rule.
    ///
    /// A pair that already has a rule keeps its earlier (higher priority) rank.
    pub fn add_merge(&mut self, pair: Pair, rank: u32, new_token_id: u32) {
        self.merges.entry(pair).or_insert((rank, new_token_id));
    }

    /// Resolve ordered string pairs against a vocabulary.
    ///
    /// Both sides of every pair and their concatenation must be in `vocab`.
    pub fn from_token_pairs<'a, I>(pairs: I, vocab: &Vocabulary) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let pairs = pairs.into_iter();
        let mut rules = Self::with_capacity(pairs.size_hint().0);

        for (rank, (left, right)) in pairs.enumerate() {
            let lookup = |token: &str| {
                vocab.get_id(token).ok_or_else(|| {
                    TokenizerError::InvalidMerge(format!(
                        "rank {}: {:?} is not in the vocabulary",
                        rank, token
                    ))
                })
            };
            let left_id = lookup(left)?;
            let right_id = lookup(right)?;
            let merged_id = lookup(format!("{}{}", left, right).as_str())?;

            rules.add_merge((left_id, right_id), rank as u32, merged_id);
        }

        Ok(rules)
    }

    /// Get the merge rule for a pair.
    ///
    /// Returns Some((rank, new_token_id)) if this pair should be merged,
    /// None otherwise.
    #[inline]
    pub fn get(&self, pair: Pair) -> Option<(u32, u32)> {
        self.merges.get(&pair).copied()
    }

    /// Get the number of merge rules.
    #[inline]
    pub fn len(&self) -> usize {
        self.merges.len()
    }

    /// Check if there are no merge rules.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.merges.is_empty()
    }
}
