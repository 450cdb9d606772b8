//! The subword engine seam.
//!
//! The structured codec needs only three things from a tokenizer: a token
//! lookup to resolve control ids, and per-text encode/decode. Loading and
//! saving vocabularies lives in [`crate::io`].

use structok_core::Result;

/// Text <-> id primitives used by [`StructuredTokenizer`](crate::StructuredTokenizer).
///
/// Implementations are read-only after construction. An engine that is not
/// `Sync` can still back a codec; callers then serialize access themselves.
pub trait SubwordEngine {
    /// Look up the id of an exact token string.
    fn token_to_id(&self, token: &str) -> Option<u32>;

    /// Encode text to ids.
    fn encode(&self, text: &str) -> Result<Vec<u32>>;

    /// Decode ids to text.
    fn decode(&self, ids: &[u32]) -> Result<String>;
}

impl<E: SubwordEngine + ?Sized> SubwordEngine for std::sync::Arc<E> {
    fn token_to_id(&self, token: &str) -> Option<u32> {
        (**self).token_to_id(token)
    }

    fn encode(&self, text: &str) -> Result<Vec<u32>> {
        (**self).encode(text)
    }

    fn decode(&self, ids: &[u32]) -> Result<String> {
        (**self).decode(ids)
    }
}
