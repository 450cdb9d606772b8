//! Encode command implementation.

use clap::Parser;
use std::path::PathBuf;

/// Encode command arguments.
#[derive(Parser)]
pub struct EncodeCommand {
    /// Path to the augmented tokenizer directory
    #[arg(short, long)]
    pub tokenizer: PathBuf,

    /// JSON file with an array of {role, content} messages ("-" for stdin)
    #[arg(short, long)]
    pub input: String,

    /// Output file (stdout if not specified)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

use super::{read_stdin_or, write_output};
use anyhow::{Context, Result as AnyhowResult};
use structok_tokenizer::{MessageRecord, StructuredTokenizer, Tokenizer};
use tracing::debug;

pub fn run(cmd: EncodeCommand) -> AnyhowResult<()> {
    let tokenizer = Tokenizer::load(&cmd.tokenizer)?;
    debug!(
        path = %cmd.tokenizer.display(),
        vocab_size = tokenizer.vocab_size(),
        "loaded tokenizer"
    );
    let codec = StructuredTokenizer::new(&tokenizer)?;

    let json = read_stdin_or(&cmd.input, |path| {
        std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path))
    })?;
    let records: Vec<MessageRecord> =
        serde_json::from_str(&json).context("input must be a JSON array of {role, content}")?;

    let ids = codec.struct_encode_records(&records)?;
    let output = ids
        .iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(" ");

    if write_output(cmd.output.as_deref(), &output)? {
        println!(
            "Encoded {} messages to {} tokens",
            records.len(),
            ids.len()
        );
    }

    Ok(())
}
