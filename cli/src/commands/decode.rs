//! Decode command implementation.

use clap::Parser;
use std::path::PathBuf;

/// Decode command arguments.
#[derive(Parser)]
pub struct DecodeCommand {
    /// Path to the augmented tokenizer directory
    #[arg(short, long)]
    pub tokenizer: PathBuf,

    /// Whitespace-separated token IDs ("-" for stdin)
    #[arg(short, long)]
    pub input: String,

    /// Output file (stdout if not specified)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

use super::{read_stdin_or, write_output};
use anyhow::{Context, Result as AnyhowResult};
use structok_tokenizer::{StructuredTokenizer, Tokenizer};
use tracing::debug;

pub fn run(cmd: DecodeCommand) -> AnyhowResult<()> {
    let tokenizer = Tokenizer::load(&cmd.tokenizer)?;
    debug!(
        path = %cmd.tokenizer.display(),
        vocab_size = tokenizer.vocab_size(),
        "loaded tokenizer"
    );
    let codec = StructuredTokenizer::new(&tokenizer)?;

    let input = read_stdin_or(&cmd.input, |ids| Ok(ids.to_string()))?;
    let ids = parse_ids(&input)?;

    let messages = codec.struct_decode(&ids)?;
    let output = serde_json::to_string_pretty(&messages)?;

    if write_output(cmd.output.as_deref(), &output)? {
        println!("Decoded {} tokens to {} messages", ids.len(), messages.len());
    }

    Ok(())
}

/// Parse whitespace- or comma-separated ids.
fn parse_ids(input: &str) -> AnyhowResult<Vec<u32>> {
    input
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<u32>()
                .with_context(|| format!("invalid token id {:?}", s))
        })
        .collect()
}
