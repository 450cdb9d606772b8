//! Format definitions for tokenizer serialization.
//!
//! `tokenizer.json` is a single document holding the augmented vocabulary,
//! its merges in rank order, the control-token table and the engine
//! configuration.

use crate::pre_tokenizer::{NormalizationForm, SplitPattern};
use crate::tokenizer::{TokenizerConfig, DEFAULT_MAX_INPUT_LEN};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use structok_core::ControlToken;

/// File name of the serialized tokenizer.
pub const TOKENIZER_FILE: &str = "tokenizer.json";

/// HuggingFace vocabulary file.
pub const VOCAB_FILE: &str = "vocab.json";

/// HuggingFace merges file.
pub const MERGES_FILE: &str = "merges.txt";

/// Header line written at the top of `merges.txt`.
pub const MERGES_HEADER: &str = "#version: 0.2";

/// Complete tokenizer serialization format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedTokenizer {
    /// Version of the crate that wrote the file
    pub version: String,
    /// Vocabulary (token -> ID mapping)
    pub vocab: HashMap<String, u32>,
    /// Merge rules in rank order
    pub merges: Vec<[String; 2]>,
    /// Control tokens
    pub control_tokens: Vec<SerializedControlToken>,
    /// Configuration
    #[serde(default)]
    pub config: SerializedConfig,
}

/// A control token entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializedControlToken {
    pub id: u32,
    pub content: String,
    pub kind: ControlToken,
}

/// Tokenizer configuration in serialized format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerializedConfig {
    pub normalization: NormalizationForm,
    pub split: SplitPattern,
    pub max_input_len: usize,
}

impl Default for SerializedConfig {
    fn default() -> Self {
        Self {
            normalization: NormalizationForm::default(),
            split: SplitPattern::default(),
            max_input_len: DEFAULT_MAX_INPUT_LEN,
        }
    }
}

impl From<&TokenizerConfig> for SerializedConfig {
    fn from(config: &TokenizerConfig) -> Self {
        Self {
            normalization: config.normalization,
            split: config.split,
            max_input_len: config.max_input_len,
        }
    }
}

impl From<SerializedConfig> for TokenizerConfig {
    fn from(config: SerializedConfig) -> Self {
        Self {
            normalization: config.normalization,
            split: config.split,
            max_input_len: config.max_input_len,
        }
    }
}
