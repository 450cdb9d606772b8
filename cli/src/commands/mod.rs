//! CLI commands for structok.

pub mod augment;
pub mod decode;
pub mod encode;

pub use augment::AugmentCommand;
pub use decode::DecodeCommand;
pub use encode::EncodeCommand;

use anyhow::{Context, Result};
use std::io::Read;
use std::path::Path;

/// Read a command input. `-` reads stdin; anything else goes to `fallback`.
pub(crate) fn read_stdin_or<F>(input: &str, fallback: F) -> Result<String>
where
    F: FnOnce(&str) -> Result<String>,
{
    if input == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("failed to read stdin")?;
        Ok(buffer)
    } else {
        fallback(input)
    }
}

/// Write to `output`, or print to stdout when no path is given.
pub(crate) fn write_output(output: Option<&Path>, content: &str) -> Result<bool> {
    match output {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("failed to write {}", path.display()))?;
            Ok(true)
        }
        None => {
            println!("{}", content);
            Ok(false)
        }
    }
}
