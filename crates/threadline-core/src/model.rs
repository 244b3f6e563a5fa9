//! ChatModel trait definition.
//!
//! The abstraction over the remote inference collaborator. Providers
//! are stateless: the full ordered message history is sent on every
//! call. Retries and backoff on transient failures are a provider
//! concern; the turn processor only distinguishes final failure from
//! success.
//!
//! Implementations live in threadline-infra (`OpenAiCompatibleModel`).

use threadline_types::model::{ChatRequest, ChatResponse, ModelError};

/// Trait for chat-completion model backends.
///
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
pub trait ChatModel: Send + Sync {
    /// Human-readable provider name (e.g., "groq").
    fn name(&self) -> &str;

    /// Send the full conversation and receive the next assistant reply.
    fn complete(
        &self,
        request: &ChatRequest,
    ) -> impl std::future::Future<Output = Result<ChatResponse, ModelError>> + Send;
}
