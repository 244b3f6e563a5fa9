//! Chat-model request/response types.
//!
//! The inference collaborator is stateless: every request carries the
//! full ordered, role-tagged message history for the thread.

use serde::{Deserialize, Serialize};

use crate::thread::Message;

/// Request to a chat-completion model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub model: String,
    /// Full ordered message history; providers ignore sequence numbers.
    pub messages: Vec<Message>,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
}

/// Response from a chat-completion model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub content: String,
    pub model: String,
    pub usage: Usage,
}

/// Token usage for one request/response pair.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// Errors from chat-model provider operations.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("provider error: {message}")]
    Provider { message: String },

    #[error("rate limited (retry after {retry_after_ms:?}ms)")]
    RateLimited { retry_after_ms: Option<u64> },

    #[error("inference timed out after {elapsed_ms}ms")]
    Timeout { elapsed_ms: u64 },

    #[error("authentication failed")]
    AuthenticationFailed,

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("deserialization error: {0}")]
    Deserialization(String),
}
