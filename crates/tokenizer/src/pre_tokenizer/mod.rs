//! Pre-tokenization pipeline.
//!
//! Operations applied before BPE encoding: control-token extraction,
//! normalization and splitting, in that order.

pub mod added;
pub mod normalize;
pub mod split;

pub use added::{AddedTokens, Segment};
pub use normalize::{NormalizationForm, Normalizer};
pub use split::{SplitPattern, Splitter};
