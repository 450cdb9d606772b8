//! structok-tokenizer - Structured chat tokenization
//!
//! This crate encodes role-tagged conversations into flat token id
//! sequences and back, on top of a GPT-2 style byte-level BPE whose
//! vocabulary has been augmented with reserved control tokens.
//!
//! # Features
//!
//! - Vocabulary augmentation reserving `<|padding|>`, `<|user|>`,
//!   `<|assistant|>` and `<|endoftext|>` at ids `0..4`
//! - Structured encode/decode with escaping of delimiter text in content
//! - Pre-tokenization pipeline (control-token extraction, normalization, splitting)
//! - Loading HuggingFace vocabularies and saving/loading `tokenizer.json`
//! - Parallel batch encode/decode
//!
//! # Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use structok_tokenizer::{Message, StructuredTokenizer, Tokenizer};
//!
//! let tokenizer = Tokenizer::load(Path::new("models/chat"))?;
//! let codec = StructuredTokenizer::new(&tokenizer)?;
//!
//! let ids = codec.struct_encode(&[Message::user("Hello"), Message::assistant("Hi there")])?;
//! let messages = codec.struct_decode(&ids)?;
//! assert_eq!(messages[1].content, "Hi there");
//! # Ok::<(), structok_tokenizer::TokenizerError>(())
//! ```

// Re-export core types
pub use structok_core::{ControlToken, Result, TokenizerError};

// Vocabulary augmentation
pub mod augment;
pub use augment::{augment, AugmentedVocabulary, SourceVocabulary};

// Engine seam
pub mod engine;
pub use engine::SubwordEngine;

// Structured codec
pub mod structured;
pub use structured::{DelimiterIds, Message, MessageRecord, Role, StructuredTokenizer};

// Tokenizer API
pub mod tokenizer;
pub use tokenizer::{Tokenizer, TokenizerBuilder, TokenizerConfig};

// IO/Serialization
pub mod io;
pub use io::{TokenizerLoader, TokenizerSaver};

// Pre-tokenization
pub mod pre_tokenizer;
pub use pre_tokenizer::{NormalizationForm, Normalizer, SplitPattern, Splitter};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
