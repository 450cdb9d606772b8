//! structok CLI - Command-line interface for structured chat tokenization.
//!
//! This is the main entry point for the `structok` command-line tool.

mod commands;

use clap::{Parser, Subcommand};
use commands::{AugmentCommand, DecodeCommand, EncodeCommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "structok")]
#[command(about = "Role-structured tokenization for chat transcripts", long_about = None)]
#[command(version)]
struct Cli {
    /// Log debug details to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reserve control tokens in a HuggingFace vocabulary
    Augment(AugmentCommand),
    /// Encode a JSON conversation to token IDs
    Encode(EncodeCommand),
    /// Decode token IDs to a JSON conversation
    Decode(DecodeCommand),
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Augment(cmd) => commands::augment::run(cmd)?,
        Commands::Encode(cmd) => commands::encode::run(cmd)?,
        Commands::Decode(cmd) => commands::decode::run(cmd)?,
    }

    Ok(())
}
