//! Reserved control tokens.
//!
//! Control tokens mark structure (role boundaries, end of sequence) rather
//! than natural-language content. They occupy the lowest id block of an
//! augmented vocabulary, in the order given by [`ControlToken::RESERVED`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// A reserved structural token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlToken {
    /// Padding, reserved but never emitted by the structured codec
    Padding,
    /// Opens a user turn
    User,
    /// Opens an assistant turn
    Assistant,
    /// Terminates a conversation
    EndOfText,
}

impl ControlToken {
    /// Reserved tokens in id order.
    pub const RESERVED: [ControlToken; 4] = [
        ControlToken::Padding,
        ControlToken::User,
        ControlToken::Assistant,
        ControlToken::EndOfText,
    ];

    /// Tokens that delimit structured messages.
    pub const DELIMITERS: [ControlToken; 3] = [
        ControlToken::User,
        ControlToken::Assistant,
        ControlToken::EndOfText,
    ];

    /// The display string stored in the vocabulary.
    pub const fn as_str(self) -> &'static str {
        match self {
            ControlToken::Padding => "<|padding|>",
            ControlToken::User => "<|user|>",
            ControlToken::Assistant => "<|assistant|>",
            ControlToken::EndOfText => "<|endoftext|>",
        }
    }

    /// Look up a control token by its display string.
    pub fn from_display(token: &str) -> Option<Self> {
        Self::RESERVED.into_iter().find(|t| t.as_str() == token)
    }
}

impl fmt::Display for ControlToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
