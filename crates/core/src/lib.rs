//! structok-core - Vocabulary and byte-level BPE primitives
//!
//! This crate provides the data structures shared by the rest of the
//! workspace: the token vocabulary with its reserved control-token table,
//! id-based merge rules, and the byte-level BPE used by the subword engine.
//!
//! # Features
//!
//! - Vocabulary storage using `AHashMap` and compact strings
//! - Control tokens (`<|padding|>`, `<|user|>`, `<|assistant|>`, `<|endoftext|>`)
//! - GPT-2 byte-to-unicode mapping and rank-ordered merge application
//! - Error handling with detailed diagnostics
//!
//! # Example
//!
//! ```rust
//! use structok_core::{ControlToken, Vocabulary};
//!
//! let mut vocab = Vocabulary::new();
//! vocab.add_token_with_id(ControlToken::User.as_str(), 0)?;
//! vocab.add_token("hello")?;
//!
//! assert_eq!(vocab.control.get(ControlToken::User), Some(0));
//! assert_eq!(vocab.get_id("hello"), Some(1));
//! # Ok::<(), structok_core::TokenizerError>(())
//! ```

pub mod error;
pub use error::{Result, TokenizerError};

// Vocabulary, merges and control tokens
pub mod core;
pub use self::core::{
    check_dense_ids, ControlToken, ControlTokens, MergeMap, MergeRules, Pair, Vocab, VocabR,
    Vocabulary,
};

// Encoding modes
pub mod encoding;
pub use encoding::{bytes_to_unicode, ByteLevelBpe};
