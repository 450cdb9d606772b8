//! State machine for structured decoding.
//!
//! Decoding walks the id sequence once. Role markers open a message,
//! end-of-text stops the walk, and everything else is buffered as content
//! of the open message. The machine itself only decides transitions; the
//! caller owns the buffer and performs the subword decoding.

use super::Role;

/// What an id means to the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    /// A role control id
    Open(Role),
    /// The end-of-text control id
    End,
    /// Any other id
    Content,
}

/// Decoder state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecodeState {
    /// No message open
    #[default]
    Idle,
    /// Inside a user message
    InUser,
    /// Inside an assistant message
    InAssistant,
}

/// Side effect of a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Append the id to the content buffer
    Buffer,
    /// Emit the open message (if any), then clear the buffer
    Flush,
    /// Emit the open message (if any), then stop reading
    Finish,
}

impl DecodeState {
    /// The role of the open message.
    pub fn role(self) -> Option<Role> {
        match self {
            DecodeState::Idle => None,
            DecodeState::InUser => Some(Role::User),
            DecodeState::InAssistant => Some(Role::Assistant),
        }
    }

    /// Transition table.
    ///
    /// Content seen while idle is buffered like any other and discarded by
    /// the next flush, since there is no open message to attach it to.
    pub fn next(self, marker: Marker) -> (DecodeState, Action) {
        match marker {
            Marker::Content => (self, Action::Buffer),
            Marker::Open(Role::User) => (DecodeState::InUser, Action::Flush),
            Marker::Open(Role::Assistant) => (DecodeState::InAssistant, Action::Flush),
            Marker::End => (DecodeState::Idle, Action::Finish),
        }
    }
}
