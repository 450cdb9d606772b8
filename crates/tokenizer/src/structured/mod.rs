//! Role-structured encoding of conversations.
//!
//! A conversation is a list of [`Message`]s. It is encoded as a flat id
//! sequence where each message starts with its role's control id, followed
//! by the subword ids of its content, and the whole sequence ends with the
//! end-of-text id:
//!
//! ```text
//! <|user|> Hello <|assistant|> Hi there <|endoftext|>
//! ```
//!
//! Control ids never pass through the subword engine. Content is escaped
//! first so that delimiter text inside a message stays content.

pub mod decode;
pub mod escape;

pub use decode::{Action, DecodeState, Marker};
pub use escape::{escape, unescape};

use crate::engine::SubwordEngine;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use structok_core::{ControlToken, Result, TokenizerError};
use tracing::{debug, warn};

/// Speaker of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// The role name used in message records.
    pub const fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }

    /// The control token that opens a message of this role.
    pub const fn control_token(self) -> ControlToken {
        match self {
            Role::User => ControlToken::User,
            Role::Assistant => ControlToken::Assistant,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = TokenizerError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            other => Err(TokenizerError::UnknownRole(other.to_string())),
        }
    }
}

/// A single conversation turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// An unvalidated message, as read from JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRecord {
    pub role: String,
    pub content: String,
}

impl TryFrom<&MessageRecord> for Message {
    type Error = TokenizerError;

    fn try_from(record: &MessageRecord) -> Result<Self> {
        Ok(Message::new(record.role.parse()?, record.content.clone()))
    }
}

impl TryFrom<MessageRecord> for Message {
    type Error = TokenizerError;

    fn try_from(record: MessageRecord) -> Result<Self> {
        Ok(Message::new(record.role.parse()?, record.content))
    }
}

impl From<Message> for MessageRecord {
    fn from(message: Message) -> Self {
        Self {
            role: message.role.as_str().to_string(),
            content: message.content,
        }
    }
}

/// Control ids resolved from the engine's vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelimiterIds {
    pub user: u32,
    pub assistant: u32,
    pub end_of_text: u32,
}

impl DelimiterIds {
    /// Resolve the delimiter ids by name.
    ///
    /// Fails with every unresolved token listed, or if two delimiters share
    /// an id.
    pub fn resolve<E: SubwordEngine + ?Sized>(engine: &E) -> Result<Self> {
        let lookup = |token: ControlToken| engine.token_to_id(token.as_str());
        let (user, assistant, end_of_text) = (
            lookup(ControlToken::User),
            lookup(ControlToken::Assistant),
            lookup(ControlToken::EndOfText),
        );

        let (Some(user), Some(assistant), Some(end_of_text)) = (user, assistant, end_of_text)
        else {
            let missing = ControlToken::DELIMITERS
                .iter()
                .filter(|&&token| lookup(token).is_none())
                .map(|token| token.as_str().to_string())
                .collect();
            return Err(TokenizerError::MissingControlTokens(missing));
        };

        if user == assistant || user == end_of_text || assistant == end_of_text {
            return Err(TokenizerError::InvalidConfig(format!(
                "control tokens share ids: user={}, assistant={}, endoftext={}",
                user, assistant, end_of_text
            )));
        }

        Ok(Self {
            user,
            assistant,
            end_of_text,
        })
    }

    /// The id that opens a message of `role`.
    #[inline]
    pub fn role_id(&self, role: Role) -> u32 {
        match role {
            Role::User => self.user,
            Role::Assistant => self.assistant,
        }
    }

    /// Classify an id for the decoder.
    #[inline]
    pub fn marker(&self, id: u32) -> Marker {
        if id == self.user {
            Marker::Open(Role::User)
        } else if id == self.assistant {
            Marker::Open(Role::Assistant)
        } else if id == self.end_of_text {
            Marker::End
        } else {
            Marker::Content
        }
    }
}

/// Encoder/decoder between conversations and flat id sequences.
///
/// Holds the resolved delimiter ids and a shared reference to the engine;
/// nothing is mutated after construction.
#[derive(Debug)]
pub struct StructuredTokenizer<'e, E: ?Sized> {
    engine: &'e E,
    ids: DelimiterIds,
}

impl<'e, E: ?Sized> Clone for StructuredTokenizer<'e, E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'e, E: ?Sized> Copy for StructuredTokenizer<'e, E> {}

impl<'e, E: SubwordEngine + ?Sized> StructuredTokenizer<'e, E> {
    /// Create a codec over `engine`, resolving the delimiter ids.
    pub fn new(engine: &'e E) -> Result<Self> {
        let ids = DelimiterIds::resolve(engine)?;
        debug!(
            user = ids.user,
            assistant = ids.assistant,
            end_of_text = ids.end_of_text,
            "resolved control token ids"
        );
        Ok(Self { engine, ids })
    }

    /// The resolved delimiter ids.
    pub fn delimiter_ids(&self) -> DelimiterIds {
        self.ids
    }

    /// The underlying engine.
    pub fn engine(&self) -> &'e E {
        self.engine
    }

    /// Encode a conversation.
    ///
    /// Content is left-trimmed; empty content contributes only the role id.
    /// The result always ends with the end-of-text id.
    pub fn struct_encode(&self, messages: &[Message]) -> Result<Vec<u32>> {
        let mut ids = Vec::with_capacity(messages.len() * 2 + 1);

        for message in messages {
            ids.push(self.ids.role_id(message.role));

            let content = message.content.trim_start();
            if !content.is_empty() {
                ids.extend(self.engine.encode(&escape(content))?);
            }
        }

        ids.push(self.ids.end_of_text);
        Ok(ids)
    }

    /// Validate and encode untyped message records.
    ///
    /// Nothing is encoded if any record has an unknown role.
    pub fn struct_encode_records(&self, records: &[MessageRecord]) -> Result<Vec<u32>> {
        let messages = records
            .iter()
            .map(Message::try_from)
            .collect::<Result<Vec<_>>>()?;
        self.struct_encode(&messages)
    }

    /// Decode an id sequence into a conversation.
    ///
    /// Reading stops at the first end-of-text id. A message still open when
    /// the input runs out without end-of-text is dropped.
    pub fn struct_decode(&self, ids: &[u32]) -> Result<Vec<Message>> {
        let mut messages = Vec::new();
        let mut state = DecodeState::Idle;
        let mut buffer: Vec<u32> = Vec::new();

        for &id in ids {
            let (next, action) = state.next(self.ids.marker(id));
            match action {
                Action::Buffer => buffer.push(id),
                Action::Flush | Action::Finish => {
                    if let Some(role) = state.role() {
                        messages.push(self.close(role, &buffer)?);
                    }
                    if action == Action::Finish {
                        return Ok(messages);
                    }
                    buffer.clear();
                }
            }
            state = next;
        }

        if let Some(role) = state.role() {
            warn!(
                role = %role,
                buffered = buffer.len(),
                "id sequence ended without end-of-text, dropping open message"
            );
        }
        Ok(messages)
    }

    fn close(&self, role: Role, buffer: &[u32]) -> Result<Message> {
        let text = if buffer.is_empty() {
            String::new()
        } else {
            unescape(&self.engine.decode(buffer)?)
        };
        Ok(Message::new(role, text.trim_start()))
    }
}

impl<'e, E: SubwordEngine + Sync + ?Sized> StructuredTokenizer<'e, E> {
    /// Encode many conversations in parallel, preserving order.
    pub fn struct_encode_batch(&self, conversations: &[Vec<Message>]) -> Result<Vec<Vec<u32>>> {
        conversations
            .par_iter()
            .map(|messages| self.struct_encode(messages))
            .collect()
    }

    /// Decode many id sequences in parallel, preserving order.
    pub fn struct_decode_batch(&self, sequences: &[Vec<u32>]) -> Result<Vec<Vec<Message>>> {
        sequences
            .par_iter()
            .map(|ids| self.struct_decode(ids))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Character-level engine: control strings map to ids 0..4, every other
    /// char to `1000 + codepoint`. Like a real engine, it turns literal
    /// delimiter text into control ids and skips them on decode.
    #[derive(Debug)]
    struct CharEngine;

    const CONTROL_BASE: u32 = 1000;

    impl SubwordEngine for CharEngine {
        fn token_to_id(&self, token: &str) -> Option<u32> {
            ControlToken::from_display(token).map(|t| t as u32)
        }

        fn encode(&self, text: &str) -> Result<Vec<u32>> {
            let mut ids = Vec::new();
            let mut rest = text;
            'outer: while let Some(ch) = rest.chars().next() {
                for token in ControlToken::RESERVED {
                    if let Some(tail) = rest.strip_prefix(token.as_str()) {
                        ids.push(token as u32);
                        rest = tail;
                        continue 'outer;
                    }
                }
                ids.push(CONTROL_BASE + ch as u32);
                rest = &rest[ch.len_utf8()..];
            }
            Ok(ids)
        }

        fn decode(&self, ids: &[u32]) -> Result<String> {
            ids.iter()
                .map(|&id| match id.checked_sub(CONTROL_BASE) {
                    Some(cp) => char::from_u32(cp)
                        .map(String::from)
                        .ok_or(TokenizerError::UnknownTokenId(id)),
                    None if (id as usize) < ControlToken::RESERVED.len() => Ok(String::new()),
                    None => Err(TokenizerError::UnknownTokenId(id)),
                })
                .collect()
        }
    }

    /// Engine whose vocabulary lacks the assistant and end-of-text tokens.
    #[derive(Debug)]
    struct PartialEngine;

    impl SubwordEngine for PartialEngine {
        fn token_to_id(&self, token: &str) -> Option<u32> {
            (token == "<|user|>").then_some(1)
        }

        fn encode(&self, _text: &str) -> Result<Vec<u32>> {
            Ok(Vec::new())
        }

        fn decode(&self, _ids: &[u32]) -> Result<String> {
            Ok(String::new())
        }
    }

    fn ids_of(text: &str) -> Vec<u32> {
        CharEngine.encode(text).unwrap()
    }

    #[test]
    fn test_resolves_delimiters_by_name() {
        let codec = StructuredTokenizer::new(&CharEngine).unwrap();
        assert_eq!(
            codec.delimiter_ids(),
            DelimiterIds {
                user: 1,
                assistant: 2,
                end_of_text: 3
            }
        );
    }

    #[test]
    fn test_missing_delimiters_are_named() {
        let err = StructuredTokenizer::new(&PartialEngine).unwrap_err();
        match &err {
            TokenizerError::MissingControlTokens(missing) => {
                assert_eq!(missing, &vec!["<|assistant|>", "<|endoftext|>"]);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.to_string().contains("<|assistant|>, <|endoftext|>"));
    }

    #[test]
    fn test_encode_layout() {
        let codec = StructuredTokenizer::new(&CharEngine).unwrap();
        let ids = codec
            .struct_encode(&[Message::user("hi"), Message::assistant("yo")])
            .unwrap();

        let mut expected = vec![1];
        expected.extend(ids_of("hi"));
        expected.push(2);
        expected.extend(ids_of("yo"));
        expected.push(3);
        assert_eq!(ids, expected);
    }

    #[test]
    fn test_encode_empty_conversation() {
        let codec = StructuredTokenizer::new(&CharEngine).unwrap();
        assert_eq!(codec.struct_encode(&[]).unwrap(), vec![3]);
    }

    #[test]
    fn test_encode_trims_leading_whitespace_only() {
        let codec = StructuredTokenizer::new(&CharEngine).unwrap();
        let ids = codec.struct_encode(&[Message::user("  \n a b  ")]).unwrap();

        let mut expected = vec![1];
        expected.extend(ids_of("a b  "));
        expected.push(3);
        assert_eq!(ids, expected);
    }

    #[test]
    fn test_whitespace_only_content_emits_role_only() {
        let codec = StructuredTokenizer::new(&CharEngine).unwrap();
        let ids = codec.struct_encode(&[Message::user("   ")]).unwrap();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn test_delimiter_text_is_escaped() {
        let codec = StructuredTokenizer::new(&CharEngine).unwrap();
        let ids = codec.struct_encode(&[Message::user("say <|user|>")]).unwrap();

        // Only the leading role id and the terminator are control ids
        assert_eq!(ids.iter().filter(|&&id| id < CONTROL_BASE).count(), 2);
        assert_eq!(
            codec.struct_decode(&ids).unwrap(),
            vec![Message::user("say <|user|>")]
        );
    }

    #[test]
    fn test_roundtrip() {
        let codec = StructuredTokenizer::new(&CharEngine).unwrap();
        let messages = vec![
            Message::user("Hello, how are you?"),
            Message::assistant("  I'm good, thanks! And you?\n"),
            Message::user(""),
            Message::assistant("<|endoftext|> and <|assistant|> are plain text"),
        ];

        let decoded = codec
            .struct_decode(&codec.struct_encode(&messages).unwrap())
            .unwrap();
        let expected: Vec<Message> = messages
            .iter()
            .map(|m| Message::new(m.role, m.content.trim_start()))
            .collect();
        assert_eq!(decoded, expected);
    }

    #[test]
    fn test_unknown_role_rejected() {
        let codec = StructuredTokenizer::new(&CharEngine).unwrap();
        let records = vec![
            MessageRecord {
                role: "user".to_string(),
                content: "ok".to_string(),
            },
            MessageRecord {
                role: "system".to_string(),
                content: "x".to_string(),
            },
        ];

        let err = codec.struct_encode_records(&records).unwrap_err();
        assert!(matches!(&err, TokenizerError::UnknownRole(role) if role == "system"));
    }

    #[test]
    fn test_records_encode_like_messages() {
        let codec = StructuredTokenizer::new(&CharEngine).unwrap();
        let records = vec![MessageRecord {
            role: "assistant".to_string(),
            content: "done".to_string(),
        }];
        assert_eq!(
            codec.struct_encode_records(&records).unwrap(),
            codec.struct_encode(&[Message::assistant("done")]).unwrap()
        );
    }

    #[test]
    fn test_decode_empty_content() {
        let codec = StructuredTokenizer::new(&CharEngine).unwrap();
        assert_eq!(
            codec.struct_decode(&[1, 2, 3]).unwrap(),
            vec![Message::user(""), Message::assistant("")]
        );
    }

    #[test]
    fn test_decode_ignores_padding_in_content() {
        let codec = StructuredTokenizer::new(&CharEngine).unwrap();
        let mut ids = vec![1, 0];
        ids.extend(ids_of("hi"));
        ids.extend([0, 3]);

        assert_eq!(codec.struct_decode(&ids).unwrap(), vec![Message::user("hi")]);
        assert_eq!(codec.struct_decode(&[1, 0, 3]).unwrap(), vec![Message::user("")]);
    }

    #[test]
    fn test_decode_drops_unterminated_message() {
        let codec = StructuredTokenizer::new(&CharEngine).unwrap();
        let mut ids = vec![1];
        ids.extend(ids_of("hi"));

        assert!(codec.struct_decode(&ids).unwrap().is_empty());
    }

    #[test]
    fn test_decode_keeps_closed_messages_before_truncation() {
        let codec = StructuredTokenizer::new(&CharEngine).unwrap();
        let mut ids = vec![1];
        ids.extend(ids_of("first"));
        ids.push(2);
        ids.extend(ids_of("cut off"));

        assert_eq!(
            codec.struct_decode(&ids).unwrap(),
            vec![Message::user("first")]
        );
    }

    #[test]
    fn test_decode_stops_at_end_of_text() {
        let codec = StructuredTokenizer::new(&CharEngine).unwrap();
        let mut ids = vec![1];
        ids.extend(ids_of("a"));
        ids.extend([3, 2]);
        ids.extend(ids_of("ignored"));
        ids.push(3);

        assert_eq!(codec.struct_decode(&ids).unwrap(), vec![Message::user("a")]);
    }

    #[test]
    fn test_decode_discards_content_before_first_role() {
        let codec = StructuredTokenizer::new(&CharEngine).unwrap();
        let mut ids = ids_of("stray");
        ids.push(2);
        ids.extend(ids_of("kept"));
        ids.push(3);

        assert_eq!(
            codec.struct_decode(&ids).unwrap(),
            vec![Message::assistant("kept")]
        );
        assert!(codec.struct_decode(&ids_of("stray")).unwrap().is_empty());
    }

    #[test]
    fn test_decode_trims_leading_whitespace() {
        let codec = StructuredTokenizer::new(&CharEngine).unwrap();
        let mut ids = vec![1];
        ids.extend(ids_of("  hi "));
        ids.push(3);

        assert_eq!(codec.struct_decode(&ids).unwrap(), vec![Message::user("hi ")]);
    }

    #[test]
    fn test_decode_propagates_engine_errors() {
        let codec = StructuredTokenizer::new(&CharEngine).unwrap();
        let err = codec.struct_decode(&[1, 7, 3]).unwrap_err();
        assert!(matches!(err, TokenizerError::UnknownTokenId(7)));
    }

    #[test]
    fn test_batch_preserves_order() {
        let codec = StructuredTokenizer::new(&CharEngine).unwrap();
        let conversations: Vec<Vec<Message>> = (0..16)
            .map(|i| vec![Message::user(format!("question {}", i)), Message::assistant("answer")])
            .collect();

        let encoded = codec.struct_encode_batch(&conversations).unwrap();
        for (ids, messages) in encoded.iter().zip(&conversations) {
            assert_eq!(ids, &codec.struct_encode(messages).unwrap());
        }
        assert_eq!(codec.struct_decode_batch(&encoded).unwrap(), conversations);
    }

    #[test]
    fn test_role_parsing() {
        assert_eq!("user".parse::<Role>().unwrap(), Role::User);
        assert_eq!("assistant".parse::<Role>().unwrap(), Role::Assistant);
        assert!(matches!(
            "User".parse::<Role>(),
            Err(TokenizerError::UnknownRole(_))
        ));
    }

    #[test]
    fn test_message_json_shape() {
        let json = serde_json::to_string(&Message::assistant("hi")).unwrap();
        assert_eq!(json, r#"{"role":"assistant","content":"hi"}"#);

        let record: MessageRecord =
            serde_json::from_str(r#"{"role":"system","content":"x"}"#).unwrap();
        assert!(Message::try_from(record).is_err());
    }
}
