//! Byte-level BPE tokenizer.
//!
//! This module provides the `Tokenizer` that backs the structured codec. It
//! ties together control-token extraction, normalization, GPT-2 splitting
//! and the byte-level BPE from `structok-core`.

use crate::augment::AugmentedVocabulary;
use crate::engine::SubwordEngine;
use crate::pre_tokenizer::{AddedTokens, NormalizationForm, Normalizer, Segment, SplitPattern, Splitter};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use structok_core::{ByteLevelBpe, MergeRules, Result, TokenizerError, Vocabulary};
use tracing::debug;

/// Default input limit in bytes.
pub const DEFAULT_MAX_INPUT_LEN: usize = 1_000_000;

/// Configuration for building a tokenizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenizerConfig {
    /// Normalization applied to text between control tokens
    pub normalization: NormalizationForm,
    /// Pre-tokenization split pattern
    pub split: SplitPattern,
    /// Largest accepted input, in bytes
    pub max_input_len: usize,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            normalization: NormalizationForm::default(),
            split: SplitPattern::default(),
            max_input_len: DEFAULT_MAX_INPUT_LEN,
        }
    }
}

/// Builder for creating a tokenizer.
#[derive(Debug, Clone, Default)]
pub struct TokenizerBuilder {
    config: TokenizerConfig,
}

impl TokenizerBuilder {
    /// Create a new tokenizer builder with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the normalization form.
    pub fn normalization(mut self, form: NormalizationForm) -> Self {
        self.config.normalization = form;
        self
    }

    /// Set the split pattern.
    pub fn split_pattern(mut self, pattern: SplitPattern) -> Self {
        self.config.split = pattern;
        self
    }

    /// Set the maximum input length in bytes.
    pub fn max_input_len(mut self, len: usize) -> Self {
        self.config.max_input_len = len;
        self
    }

    /// The configuration built so far.
    pub fn config(&self) -> TokenizerConfig {
        self.config
    }

    /// Build a tokenizer over an augmented vocabulary.
    pub fn build(self, vocab: &AugmentedVocabulary) -> Result<Tokenizer> {
        Tokenizer::from_augmented(vocab, self.config)
    }
}

/// Byte-level BPE tokenizer.
///
/// Immutable after construction and safe to share across threads.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    /// Vocabulary and merges
    bpe: ByteLevelBpe,
    /// Control-token matcher
    added: AddedTokens,
    /// Unicode normalizer
    normalizer: Normalizer,
    /// Text splitter
    splitter: Splitter,
    /// Configuration
    config: TokenizerConfig,
}

impl Tokenizer {
    /// Create a tokenizer from a vocabulary and id-based merge rules.
    pub fn new(vocab: Vocabulary, merges: MergeRules, config: TokenizerConfig) -> Result<Self> {
        vocab.check_dense()?;
        let added = AddedTokens::new(vocab.control.iter().map(|(token, id)| (token.as_str(), id)))?;

        debug!(
            vocab_size = vocab.len(),
            merges = merges.len(),
            control_tokens = added.len(),
            normalization = %config.normalization,
            "built tokenizer"
        );

        Ok(Self {
            bpe: ByteLevelBpe::new(Arc::new(vocab), Arc::new(merges)),
            added,
            normalizer: Normalizer::new(config.normalization),
            splitter: Splitter::new(config.split),
            config,
        })
    }

    /// Create a tokenizer from an augmented vocabulary.
    pub fn from_augmented(augmented: &AugmentedVocabulary, config: TokenizerConfig) -> Result<Self> {
        augmented.check_contiguous()?;

        let mut vocab = Vocabulary::with_capacity(augmented.len());
        for (token, &id) in &augmented.vocab {
            vocab.add_token_with_id(token, id)?;
        }
        let merges = MergeRules::from_token_pairs(
            augmented
                .merges
                .iter()
                .map(|(left, right)| (left.as_str(), right.as_str())),
            &vocab,
        )?;

        Self::new(vocab, merges, config)
    }

    /// Create a tokenizer builder.
    pub fn builder() -> TokenizerBuilder {
        TokenizerBuilder::new()
    }

    /// Encode text to token IDs.
    ///
    /// Control-token strings are matched first and never normalized; the
    /// text between them is normalized, split and BPE-encoded.
    pub fn encode(&self, text: &str) -> Result<Vec<u32>> {
        if text.len() > self.config.max_input_len {
            return Err(TokenizerError::Tokenization(format!(
                "Text too large: {} bytes (max: {})",
                text.len(),
                self.config.max_input_len
            )));
        }

        let mut ids = Vec::with_capacity(text.len() / 3 + 1);
        for segment in self.added.segments(text) {
            match segment {
                Segment::Control(id) => ids.push(id),
                Segment::Text(piece) => {
                    let normalized = self.normalizer.normalize(piece);
                    for word in self.splitter.split(&normalized) {
                        ids.extend(self.bpe.encode_word(word)?);
                    }
                }
            }
        }

        Ok(ids)
    }

    /// Decode token IDs back to text.
    ///
    /// Control ids are skipped. Fails on an unknown id.
    pub fn decode(&self, ids: &[u32]) -> Result<String> {
        let control = &self.bpe.vocab().control;
        let content: Vec<u32> = ids
            .iter()
            .copied()
            .filter(|&id| !control.is_control(id))
            .collect();
        self.bpe.decode(&content)
    }

    /// Get the ID of an exact token string.
    pub fn token_to_id(&self, token: &str) -> Option<u32> {
        self.bpe.vocab().get_id(token)
    }

    /// Get the token string of an ID.
    pub fn id_to_token(&self, id: u32) -> Option<&str> {
        self.bpe.vocab().get_token(id)
    }

    /// Get the vocabulary size.
    pub fn vocab_size(&self) -> usize {
        self.bpe.vocab().len()
    }

    /// Get a reference to the vocabulary.
    pub fn vocab(&self) -> &Vocabulary {
        self.bpe.vocab()
    }

    /// Get the configuration.
    pub fn config(&self) -> &TokenizerConfig {
        &self.config
    }

    /// Rebuild the string form of the vocabulary and merges.
    ///
    /// Merges come back in rank order.
    pub fn to_augmented(&self) -> Result<AugmentedVocabulary> {
        let vocab = self.bpe.vocab();
        let token = |id: u32| {
            vocab
                .get_token(id)
                .map(str::to_string)
                .ok_or(TokenizerError::UnknownTokenId(id))
        };

        let mut ranked: Vec<(u32, (u32, u32))> = self
            .bpe
            .merges()
            .merges
            .iter()
            .map(|(&pair, &(rank, _))| (rank, pair))
            .collect();
        ranked.sort_unstable_by_key(|&(rank, _)| rank);

        let merges = ranked
            .into_iter()
            .map(|(_, (left, right))| Ok((token(left)?, token(right)?)))
            .collect::<Result<Vec<_>>>()?;

        let mut control: Vec<_> = vocab.control.iter().collect();
        control.sort_by_key(|&(_, id)| id);

        Ok(AugmentedVocabulary {
            vocab: vocab
                .vocab
                .iter()
                .map(|(token, &id)| (token.to_string(), id))
                .collect(),
            merges,
            control,
        })
    }

    /// Save the tokenizer to a directory.
    pub fn save(&self, path: &Path) -> Result<()> {
        use crate::io::save::TokenizerSaver;

        let augmented = self.to_augmented()?;
        TokenizerSaver::new(&augmented, &self.config).save(path)
    }

    /// Load a tokenizer from a directory written by [`save`](Self::save).
    pub fn load(path: &Path) -> Result<Self> {
        use crate::io::load::TokenizerLoader;

        let (augmented, config) = TokenizerLoader::load(path)?;
        Self::from_augmented(&augmented, config)
    }
}

impl SubwordEngine for Tokenizer {
    fn token_to_id(&self, token: &str) -> Option<u32> {
        Tokenizer::token_to_id(self, token)
    }

    fn encode(&self, text: &str) -> Result<Vec<u32>> {
        Tokenizer::encode(self, text)
    }

    fn decode(&self, ids: &[u32]) -> Result<String> {
        Tokenizer::decode(self, ids)
    }
}
