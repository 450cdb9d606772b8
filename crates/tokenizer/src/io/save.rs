//! Save functionality for augmented tokenizers.

use super::format::{
    SerializedConfig, SerializedControlToken, SerializedTokenizer, MERGES_FILE, MERGES_HEADER,
    TOKENIZER_FILE, VOCAB_FILE,
};
use crate::augment::AugmentedVocabulary;
use crate::tokenizer::TokenizerConfig;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use structok_core::{Result, TokenizerError};
use tracing::debug;

/// Tokenizer saver.
pub struct TokenizerSaver<'a> {
    /// Vocabulary reference
    vocab: &'a AugmentedVocabulary,
    /// Engine configuration
    config: &'a TokenizerConfig,
}

impl<'a> TokenizerSaver<'a> {
    /// Create a new tokenizer saver.
    pub fn new(vocab: &'a AugmentedVocabulary, config: &'a TokenizerConfig) -> Self {
        Self { vocab, config }
    }

    /// Save the tokenizer to a directory.
    ///
    /// This saves a single `tokenizer.json` file containing all model data.
    pub fn save(&self, path: &Path) -> Result<()> {
        create_dir(path)?;

        let file_path = path.join(TOKENIZER_FILE);
        let writer = create(&file_path)?;
        serde_json::to_writer_pretty(writer, &self.serialize())?;

        debug!(path = %file_path.display(), vocab_size = self.vocab.len(), "saved tokenizer");
        Ok(())
    }

    /// Save in HuggingFace format (vocab.json + merges.txt).
    ///
    /// The control tokens are written as ordinary vocabulary entries.
    pub fn save_huggingface(&self, path: &Path) -> Result<()> {
        create_dir(path)?;

        let vocab_path = path.join(VOCAB_FILE);
        serde_json::to_writer_pretty(create(&vocab_path)?, &self.vocab.vocab)?;

        let merges_path = path.join(MERGES_FILE);
        let io_err = |err| TokenizerError::Io {
            path: merges_path.clone(),
            err,
        };
        let mut writer = create(&merges_path)?;
        writeln!(writer, "{}", MERGES_HEADER).map_err(io_err)?;
        for (left, right) in &self.vocab.merges {
            writeln!(writer, "{} {}", left, right).map_err(io_err)?;
        }
        writer.flush().map_err(io_err)?;

        debug!(path = %path.display(), "saved huggingface vocabulary");
        Ok(())
    }

    /// Serialize the tokenizer to a structure.
    fn serialize(&self) -> SerializedTokenizer {
        SerializedTokenizer {
            version: env!("CARGO_PKG_VERSION").to_string(),
            vocab: self.vocab.vocab.clone(),
            merges: self
                .vocab
                .merges
                .iter()
                .map(|(left, right)| [left.clone(), right.clone()])
                .collect(),
            control_tokens: self
                .vocab
                .control
                .iter()
                .map(|&(kind, id)| SerializedControlToken {
                    id,
                    content: kind.as_str().to_string(),
                    kind,
                })
                .collect(),
            config: SerializedConfig::from(self.config),
        }
    }
}

fn create_dir(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path).map_err(|err| TokenizerError::Io {
        path: path.to_path_buf(),
        err,
    })
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    File::create(path)
        .map(BufWriter::new)
        .map_err(|err| TokenizerError::Io {
            path: path.to_path_buf(),
            err,
        })
}
