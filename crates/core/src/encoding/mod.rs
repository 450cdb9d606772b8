//! Encoding modes for BPE tokenization.
//!
//! Only byte-level (GPT-2 style) encoding is provided: text is treated as
//! UTF-8 bytes, each byte mapped to a printable unicode character before
//! merge rules are applied.

pub mod byte_level;

pub use byte_level::{bytes_to_unicode, ByteLevelBpe};
