//! Augment command implementation.

use clap::Parser;
use std::path::PathBuf;
use structok_tokenizer::NormalizationForm;

/// Augment command arguments.
#[derive(Parser)]
pub struct AugmentCommand {
    /// Directory holding the source vocab.json and merges.txt
    #[arg(short, long)]
    pub source: PathBuf,

    /// Directory to write the augmented tokenizer to
    #[arg(short, long)]
    pub output: PathBuf,

    /// Normalization applied to content before splitting
    #[arg(short, long, default_value = "bert")]
    pub normalization: NormalizationForm,

    /// Also write vocab.json and merges.txt next to tokenizer.json
    #[arg(long, default_value_t = false)]
    pub huggingface: bool,
}

use anyhow::{Context, Result as AnyhowResult};
use structok_tokenizer::{augment, Tokenizer, TokenizerLoader, TokenizerSaver};

pub fn run(cmd: AugmentCommand) -> AnyhowResult<()> {
    let source = TokenizerLoader::load_huggingface_source(&cmd.source)
        .with_context(|| format!("failed to load source vocabulary from {}", cmd.source.display()))?;
    let augmented = augment(&source)?;

    // Building the engine checks every merge against the new vocabulary
    let config = Tokenizer::builder().normalization(cmd.normalization).config();
    Tokenizer::from_augmented(&augmented, config)?;

    let saver = TokenizerSaver::new(&augmented, &config);
    saver.save(&cmd.output)?;
    if cmd.huggingface {
        saver.save_huggingface(&cmd.output)?;
    }

    println!(
        "Augmented {} source tokens to {} tokens ({} merges), saved to {}",
        source.vocab.len(),
        augmented.len(),
        augmented.merges.len(),
        cmd.output.display()
    );

    Ok(())
}
