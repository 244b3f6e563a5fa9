//! Stable export/import serialization for conversations.
//!
//! The only place "format" matters: a versioned JSON document used for
//! debugging, portability, and the file-backed checkpoint store.
//! `import(export(state)) == state` holds for every valid state.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use threadline_types::thread::{
    ConversationState, Message, ThreadId, EXPORT_FORMAT_VERSION,
};

/// Versioned, serialization-stable form of a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationExport {
    pub format_version: u32,
    pub thread_id: String,
    pub messages: Vec<Message>,
    pub metadata: BTreeMap<String, serde_json::Value>,
}

/// Errors from importing a serialized conversation.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("unsupported export format version {0} (current is {EXPORT_FORMAT_VERSION})")]
    UnsupportedVersion(u32),

    #[error("invalid thread id: {0}")]
    InvalidThreadId(String),

    #[error("invalid message sequence: {0}")]
    InvalidSequence(String),
}

/// Render a conversation into its stable serialized form.
///
/// Pure function of the state; no I/O.
pub fn export(state: &ConversationState) -> ConversationExport {
    ConversationExport {
        format_version: EXPORT_FORMAT_VERSION,
        thread_id: state.thread_id.to_string(),
        messages: state.messages.clone(),
        metadata: state.metadata.clone(),
    }
}

/// Reconstruct a conversation from its serialized form.
///
/// Validates the format version, thread id, and sequence monotonicity
/// so corrupt documents are rejected rather than round-tripped.
pub fn import(doc: ConversationExport) -> Result<ConversationState, ExportError> {
    if doc.format_version != EXPORT_FORMAT_VERSION {
        return Err(ExportError::UnsupportedVersion(doc.format_version));
    }
    let thread_id: ThreadId = doc
        .thread_id
        .parse()
        .map_err(ExportError::InvalidThreadId)?;

    let state = ConversationState {
        thread_id,
        messages: doc.messages,
        metadata: doc.metadata,
    };
    state.validate().map_err(ExportError::InvalidSequence)?;
    Ok(state)
}
