//! Thread identifiers, messages, and conversation state.
//!
//! A thread is an isolated conversation identified by an opaque id.
//! Messages within a thread carry monotonically increasing sequence
//! numbers assigned at append time; the sequence defines the total
//! order the persistence layer must preserve.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Maximum accepted length of a thread id, in bytes.
pub const MAX_THREAD_ID_LEN: usize = 128;

/// Metadata key recording when a conversation was first created.
pub const META_CREATED_AT: &str = "created_at";

/// Metadata key recording the export format version in use.
pub const META_FORMAT_VERSION: &str = "format_version";

/// Current version of the export serialization format.
pub const EXPORT_FORMAT_VERSION: u32 = 1;

/// Validated, opaque thread identifier.
///
/// Externally supplied and immutable for the conversation's lifetime.
/// The allowed character set (`[A-Za-z0-9._-]`, non-empty, at most
/// [`MAX_THREAD_ID_LEN`] bytes) also keeps ids safe to use as file
/// names in the file-backed checkpoint store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ThreadId(String);

impl ThreadId {
    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ThreadId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err("thread id must not be empty".to_string());
        }
        if s.len() > MAX_THREAD_ID_LEN {
            return Err(format!(
                "thread id exceeds {MAX_THREAD_ID_LEN} bytes ({} given)",
                s.len()
            ));
        }
        if let Some(bad) = s
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')))
        {
            return Err(format!("thread id contains invalid character '{bad}'"));
        }
        Ok(ThreadId(s.to_string()))
    }
}

impl TryFrom<String> for ThreadId {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<ThreadId> for String {
    fn from(id: ThreadId) -> Self {
        id.0
    }
}

/// Role of a message within a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRole::System => write!(f, "system"),
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
        }
    }
}

impl FromStr for MessageRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "system" => Ok(MessageRole::System),
            "user" => Ok(MessageRole::User),
            "assistant" => Ok(MessageRole::Assistant),
            other => Err(format!("invalid message role: '{other}'")),
        }
    }
}

/// A single immutable message within a thread.
///
/// `sequence` is the per-thread monotonic position assigned when the
/// message was appended. Sequence numbers are unique within a thread,
/// not globally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
    pub sequence: u64,
}

impl Message {
    pub fn new(role: MessageRole, content: impl Into<String>, sequence: u64) -> Self {
        Self {
            role,
            content: content.into(),
            sequence,
        }
    }
}

/// The full state of one conversation thread.
///
/// Owned by exactly one thread id. Messages are append-only during
/// normal operation; the turn processor appends exactly one user
/// message and (on success) exactly one assistant message per turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationState {
    pub thread_id: ThreadId,
    pub messages: Vec<Message>,
    /// Arbitrary checkpoint metadata (creation time, format version, ...).
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl ConversationState {
    /// Create an empty conversation for a newly seen thread id.
    ///
    /// Seeds metadata with the creation timestamp and the export
    /// format version.
    pub fn new(thread_id: ThreadId) -> Self {
        let mut metadata = BTreeMap::new();
        metadata.insert(
            META_CREATED_AT.to_string(),
            serde_json::Value::String(Utc::now().to_rfc3339()),
        );
        metadata.insert(
            META_FORMAT_VERSION.to_string(),
            serde_json::Value::from(EXPORT_FORMAT_VERSION),
        );
        Self {
            thread_id,
            messages: Vec::new(),
            metadata,
        }
    }

    /// The sequence number the next appended message will receive.
    pub fn next_sequence(&self) -> u64 {
        self.messages.len() as u64
    }

    fn push(&mut self, role: MessageRole, content: impl Into<String>) -> &Message {
        let message = Message::new(role, content, self.next_sequence());
        self.messages.push(message);
        self.messages.last().expect("just pushed")
    }

    /// Append a user message with the next sequence number.
    pub fn push_user(&mut self, content: impl Into<String>) -> &Message {
        self.push(MessageRole::User, content)
    }

    /// Append an assistant message with the next sequence number.
    pub fn push_assistant(&mut self, content: impl Into<String>) -> &Message {
        self.push(MessageRole::Assistant, content)
    }

    /// Structural validation: sequence numbers strictly increasing.
    ///
    /// Used by checkpoint loaders to detect corrupt persisted state
    /// before handing it back to callers.
    pub fn validate(&self) -> Result<(), String> {
        for pair in self.messages.windows(2) {
            if pair[1].sequence <= pair[0].sequence {
                return Err(format!(
                    "non-monotonic sequence: {} followed by {}",
                    pair[0].sequence, pair[1].sequence
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thread_id_accepts_valid_ids() {
        for id in ["t1", "user-42", "a.b_c-d", "0191c2d3-uuid-ish"] {
            assert!(id.parse::<ThreadId>().is_ok(), "should accept '{id}'");
        }
    }

    #[test]
    fn test_thread_id_rejects_empty() {
        let err = "".parse::<ThreadId>().unwrap_err();
        assert!(err.contains("empty"));
    }

    #[test]
    fn test_thread_id_rejects_invalid_characters() {
        for id in ["a/b", "a b", "tab\tid", "../escape"] {
            assert!(id.parse::<ThreadId>().is_err(), "should reject '{id}'");
        }
    }

    #[test]
    fn test_thread_id_rejects_overlong() {
        let id = "x".repeat(MAX_THREAD_ID_LEN + 1);
        assert!(id.parse::<ThreadId>().is_err());
    }

    #[test]
    fn test_thread_id_serde_validates() {
        let ok: Result<ThreadId, _> = serde_json::from_str("\"t1\"");
        assert!(ok.is_ok());
        let bad: Result<ThreadId, _> = serde_json::from_str("\"has space\"");
        assert!(bad.is_err());
    }

    #[test]
    fn test_message_role_roundtrip() {
        for role in [MessageRole::System, MessageRole::User, MessageRole::Assistant] {
            let s = role.to_string();
            let parsed: MessageRole = s.parse().unwrap();
            assert_eq!(role, parsed);
        }
    }

    #[test]
    fn test_new_state_has_creation_metadata() {
        let state = ConversationState::new("t1".parse().unwrap());
        assert!(state.messages.is_empty());
        assert!(state.metadata.contains_key(META_CREATED_AT));
        assert_eq!(
            state.metadata.get(META_FORMAT_VERSION),
            Some(&serde_json::Value::from(EXPORT_FORMAT_VERSION))
        );
    }

    #[test]
    fn test_push_assigns_dense_sequences() {
        let mut state = ConversationState::new("t1".parse().unwrap());
        state.push_user("hi");
        state.push_assistant("hello");
        state.push_user("how are you?");
        let sequences: Vec<u64> = state.messages.iter().map(|m| m.sequence).collect();
        assert_eq!(sequences, vec![0, 1, 2]);
        assert_eq!(state.next_sequence(), 3);
    }

    #[test]
    fn test_validate_accepts_ordered_messages() {
        let mut state = ConversationState::new("t1".parse().unwrap());
        state.push_user("a");
        state.push_assistant("b");
        assert!(state.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_non_monotonic() {
        let mut state = ConversationState::new("t1".parse().unwrap());
        state.messages.push(Message::new(MessageRole::User, "a", 1));
        state.messages.push(Message::new(MessageRole::Assistant, "b", 1));
        assert!(state.validate().is_err());
    }

    #[test]
    fn test_state_serde_roundtrip() {
        let mut state = ConversationState::new("t1".parse().unwrap());
        state.push_user("hi");
        state.push_assistant("hello");
        let json = serde_json::to_string(&state).unwrap();
        let parsed: ConversationState = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, state);
    }
}
