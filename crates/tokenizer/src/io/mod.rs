//! Serialization and deserialization of tokenizers.
//!
//! Augmented tokenizers are stored as a single `tokenizer.json`. Upstream
//! vocabularies are read from HuggingFace `vocab.json` + `merges.txt`.

pub mod format;
pub mod load;
pub mod save;

pub use format::SerializedTokenizer;
pub use load::TokenizerLoader;
pub use save::TokenizerSaver;
