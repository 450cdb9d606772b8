//! Load functionality for tokenizers and source vocabularies.

use super::format::{SerializedTokenizer, MERGES_FILE, TOKENIZER_FILE, VOCAB_FILE};
use crate::augment::{AugmentedVocabulary, SourceVocabulary};
use crate::tokenizer::TokenizerConfig;
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use structok_core::{ControlToken, Result, TokenizerError};
use tracing::debug;

/// Tokenizer loader.
pub struct TokenizerLoader;

impl TokenizerLoader {
    /// Load a tokenizer written by [`TokenizerSaver::save`](super::TokenizerSaver::save).
    ///
    /// Expects a `tokenizer.json` file in the given directory. The vocabulary
    /// must be contiguous and every merge must reference known tokens.
    pub fn load(path: &Path) -> Result<(AugmentedVocabulary, TokenizerConfig)> {
        let file_path = path.join(TOKENIZER_FILE);
        let serialized: SerializedTokenizer = serde_json::from_reader(open(&file_path)?)?;

        debug!(
            path = %file_path.display(),
            version = %serialized.version,
            vocab_size = serialized.vocab.len(),
            merges = serialized.merges.len(),
            "loaded tokenizer file"
        );

        Self::deserialize(serialized)
    }

    /// Load an upstream vocabulary in HuggingFace format.
    ///
    /// Expects two files in the given directory:
    /// - `vocab.json`: Token to ID mapping
    /// - `merges.txt`: Merge rules, one per line, in rank order
    ///
    /// Blank lines and lines starting with `#` in `merges.txt` are skipped.
    pub fn load_huggingface_source(path: &Path) -> Result<SourceVocabulary> {
        let vocab_path = path.join(VOCAB_FILE);
        let vocab: HashMap<String, u32> = serde_json::from_reader(open(&vocab_path)?)?;

        let merges_path = path.join(MERGES_FILE);
        let content = std::fs::read_to_string(&merges_path).map_err(|err| TokenizerError::Io {
            path: merges_path.clone(),
            err,
        })?;
        let merges = parse_merges(&content)?;

        debug!(
            path = %path.display(),
            vocab_size = vocab.len(),
            merges = merges.len(),
            "loaded source vocabulary"
        );

        Ok(SourceVocabulary { vocab, merges })
    }

    /// Deserialize from a serialized structure.
    fn deserialize(data: SerializedTokenizer) -> Result<(AugmentedVocabulary, TokenizerConfig)> {
        let mut control = Vec::with_capacity(data.control_tokens.len());
        for entry in data.control_tokens {
            if entry.content != entry.kind.as_str() {
                return Err(TokenizerError::Load(format!(
                    "control token {:?} recorded with content {:?}",
                    entry.kind, entry.content
                )));
            }
            control.push((entry.kind, entry.id));
        }

        let augmented = AugmentedVocabulary {
            vocab: data.vocab,
            merges: data
                .merges
                .into_iter()
                .map(|[left, right]| (left, right))
                .collect(),
            control,
        };
        augmented.check_contiguous()?;
        check_merges(&augmented)?;

        // Control tokens present in the vocabulary but missing from the table
        let unlisted: Vec<&str> = ControlToken::RESERVED
            .iter()
            .filter(|&&token| augmented.control_id(token).is_none())
            .filter(|token| augmented.get_id(token.as_str()).is_some())
            .map(|token| token.as_str())
            .collect();
        if !unlisted.is_empty() {
            return Err(TokenizerError::Load(format!(
                "control tokens missing from the control table: {}",
                unlisted.join(", ")
            )));
        }

        Ok((augmented, data.config.into()))
    }
}

fn open(path: &Path) -> Result<BufReader<File>> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|err| TokenizerError::Io {
            path: path.to_path_buf(),
            err,
        })
}

/// Parse `merges.txt` content into ordered pairs.
fn parse_merges(content: &str) -> Result<Vec<(String, String)>> {
    let mut merges = Vec::new();

    for (line_num, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut parts = line.split_whitespace();
        match (parts.next(), parts.next(), parts.next()) {
            (Some(left), Some(right), None) => merges.push((left.to_string(), right.to_string())),
            _ => {
                return Err(TokenizerError::Load(format!(
                    "Invalid merge format at line {}: '{}'",
                    line_num + 1,
                    line
                )))
            }
        }
    }

    Ok(merges)
}

/// Check that both sides of every merge and their concatenation are known.
fn check_merges(vocab: &AugmentedVocabulary) -> Result<()> {
    for (rank, (left, right)) in vocab.merges.iter().enumerate() {
        let merged = format!("{}{}", left, right);
        for token in [left.as_str(), right.as_str(), merged.as_str()] {
            if vocab.get_id(token).is_none() {
                return Err(TokenizerError::InvalidMerge(format!(
                    "rank {}: {:?} is not in the vocabulary",
                    rank, token
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::augment::augment;
    use crate::io::save::TokenizerSaver;
    use crate::pre_tokenizer::NormalizationForm;
    use std::fs;

    fn fixture() -> AugmentedVocabulary {
        let source = SourceVocabulary {
            vocab: HashMap::from([
                ("a".to_string(), 0),
                ("b".to_string(), 1),
                ("ab".to_string(), 2),
                ("<|endoftext|>".to_string(), 3),
            ]),
            merges: vec![("a".to_string(), "b".to_string())],
        };
        augment(&source).unwrap()
    }

    #[test]
    fn test_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let augmented = fixture();
        let config = TokenizerConfig {
            normalization: NormalizationForm::Bert,
            ..Default::default()
        };

        TokenizerSaver::new(&augmented, &config)
            .save(dir.path())
            .unwrap();
        let (loaded, loaded_config) = TokenizerLoader::load(dir.path()).unwrap();

        assert_eq!(loaded, augmented);
        assert_eq!(loaded_config, config);
    }

    #[test]
    fn test_load_missing_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();

        match TokenizerLoader::load(dir.path()) {
            Err(TokenizerError::Io { path, .. }) => {
                assert_eq!(path, dir.path().join(TOKENIZER_FILE));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_load_rejects_gap() {
        let dir = tempfile::tempdir().unwrap();
        let mut augmented = fixture();
        augmented.vocab.insert("zz".to_string(), 99);

        TokenizerSaver::new(&augmented, &TokenizerConfig::default())
            .save(dir.path())
            .unwrap();

        assert!(matches!(
            TokenizerLoader::load(dir.path()),
            Err(TokenizerError::VocabularyNotDense { .. })
        ));
    }

    #[test]
    fn test_load_rejects_unknown_merge_token() {
        let dir = tempfile::tempdir().unwrap();
        let mut augmented = fixture();
        augmented.merges.push(("b".to_string(), "a".to_string()));

        TokenizerSaver::new(&augmented, &TokenizerConfig::default())
            .save(dir.path())
            .unwrap();

        assert!(matches!(
            TokenizerLoader::load(dir.path()),
            Err(TokenizerError::InvalidMerge(_))
        ));
    }

    #[test]
    fn test_load_rejects_mislabelled_control_token() {
        let dir = tempfile::tempdir().unwrap();
        TokenizerSaver::new(&fixture(), &TokenizerConfig::default())
            .save(dir.path())
            .unwrap();

        let file = dir.path().join(TOKENIZER_FILE);
        let json = fs::read_to_string(&file).unwrap();
        let mut data: SerializedTokenizer = serde_json::from_str(&json).unwrap();
        data.control_tokens[1].content = "<|assistant|>".to_string();
        fs::write(&file, serde_json::to_string(&data).unwrap()).unwrap();

        assert!(matches!(
            TokenizerLoader::load(dir.path()),
            Err(TokenizerError::Load(_))
        ));
    }

    #[test]
    fn test_load_huggingface_source() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(VOCAB_FILE),
            r#"{"a": 0, "b": 1, "ab": 2, "<|endoftext|>": 3}"#,
        )
        .unwrap();
        fs::write(dir.path().join(MERGES_FILE), "#version: 0.2\n\na b\n").unwrap();

        let source = TokenizerLoader::load_huggingface_source(dir.path()).unwrap();
        assert_eq!(source.vocab.len(), 4);
        assert_eq!(source.merges, vec![("a".to_string(), "b".to_string())]);
    }

    #[test]
    fn test_load_huggingface_source_bad_merge_line() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(VOCAB_FILE), r#"{"a": 0}"#).unwrap();
        fs::write(dir.path().join(MERGES_FILE), "a b\na b c\n").unwrap();

        let err = TokenizerLoader::load_huggingface_source(dir.path()).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_load_huggingface_source_missing_merges() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(VOCAB_FILE), r#"{"a": 0}"#).unwrap();

        assert!(matches!(
            TokenizerLoader::load_huggingface_source(dir.path()),
            Err(TokenizerError::Io { .. })
        ));
    }

    #[test]
    fn test_parse_merges_skips_comments() {
        let merges = parse_merges("#version: 0.2\n  \nĠ t\n# note\nh e\n").unwrap();
        assert_eq!(
            merges,
            vec![
                ("Ġ".to_string(), "t".to_string()),
                ("h".to_string(), "e".to_string())
            ]
        );
    }
}
