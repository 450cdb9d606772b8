//! Error types for the structok libraries.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the tokenizer library.
#[derive(Error, Debug)]
pub enum TokenizerError {
    /// Error during tokenization
    #[error("Tokenization error: {0}")]
    Tokenization(String),

    /// Error loading vocabulary or merges
    #[error("Load error: {0}")]
    Load(String),

    /// I/O error with file context
    #[error("I/O error for {path}: {err}")]
    Io {
        path: PathBuf,
        #[source]
        err: std::io::Error,
    },

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Required control tokens have no id in the loaded vocabulary
    #[error("Control tokens missing from vocabulary: {}", .0.join(", "))]
    MissingControlTokens(Vec<String>),

    /// Unknown token ID
    #[error("Unknown token ID: {0}")]
    UnknownTokenId(u32),

    /// Unknown token string
    #[error("Unknown token: {0}")]
    UnknownToken(String),

    /// Unknown message role
    #[error("Unknown role: {0}")]
    UnknownRole(String),

    /// Token id range has a gap or a duplicate
    #[error("Vocabulary ids are not dense over [0, {size}): {detail}")]
    VocabularyNotDense { size: usize, detail: String },

    /// A reserved control token is already present in the source vocabulary
    #[error("Reserved token {token} already present in source vocabulary at id {id}")]
    ReservedTokenCollision { token: String, id: u32 },

    /// The folded final slot of the source vocabulary holds an ordinary token
    #[error("Final slot {id} holds {token:?}, expected a reserved control token")]
    FoldedSlot { token: String, id: u32 },

    /// Invalid merge rule
    #[error("Invalid merge rule: {0}")]
    InvalidMerge(String),
}

/// Result type alias for tokenizer operations.
pub type Result<T> = std::result::Result<T, TokenizerError>;
