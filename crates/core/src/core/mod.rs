//! Vocabulary, merge rules and control tokens.
//!
//! These are the data structures every other component shares, independent
//! of how text is normalized or split.

pub mod control;
pub mod merges;
pub mod vocab;

pub use control::ControlToken;
pub use merges::{MergeMap, MergeRules, Pair};
pub use vocab::{check_dense_ids, ControlTokens, Vocab, VocabR, Vocabulary};
