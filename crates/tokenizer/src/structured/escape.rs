//! Escaping of delimiter text inside message content.
//!
//! The engine maps a literal `<|user|>` in its input straight to the control
//! id, so content that mentions a delimiter would split the conversation.
//! Before encoding, each delimiter's `<` and `>` are prefixed with a
//! backslash; after decoding the substitution is reversed.

/// Delimiter strings and their escaped forms, in substitution order.
const ESCAPES: [(&str, &str); 3] = [
    ("<|user|>", "\\<|user|\\>"),
    ("<|assistant|>", "\\<|assistant|\\>"),
    ("<|endoftext|>", "\\<|endoftext|\\>"),
];

/// Escape every literal delimiter in `text`.
///
/// One non-recursive pass per delimiter.
pub fn escape(text: &str) -> String {
    ESCAPES
        .iter()
        .fold(text.to_string(), |acc, (raw, escaped)| acc.replace(raw, escaped))
}

/// Reverse [`escape`].
pub fn unescape(text: &str) -> String {
    ESCAPES
        .iter()
        .fold(text.to_string(), |acc, (raw, escaped)| acc.replace(escaped, raw))
}
