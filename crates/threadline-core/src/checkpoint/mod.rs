//! Checkpointer trait definition.
//!
//! Durable persistence and restoration of conversation state,
//! independent of the in-memory registry lifetime: the registry can be
//! rebuilt from the checkpointer after a restart.
//!
//! Implementations live in threadline-infra (`SqliteCheckpointer`,
//! `JsonFileCheckpointer`, `MemoryCheckpointer`). Uses native async fn
//! in traits (RPITIT, Rust 2024 edition).

pub mod boxed;

pub use boxed::BoxCheckpointer;

use threadline_types::error::CheckpointError;
use threadline_types::thread::{ConversationState, ThreadId};

/// Contract for conversation checkpoint stores.
///
/// Any backend satisfying the atomicity contract is acceptable: a
/// `save` must be atomic with respect to a concurrent `load` of the
/// same thread, so a reader never observes a partially written
/// message sequence.
pub trait Checkpointer: Send + Sync {
    /// Persist the full message sequence and metadata for the state's
    /// thread, replacing any previous checkpoint.
    fn save(
        &self,
        state: &ConversationState,
    ) -> impl std::future::Future<Output = Result<(), CheckpointError>> + Send;

    /// Reconstruct the most recently saved state for a thread.
    ///
    /// `Ok(None)` means the thread was never saved; this is distinct
    /// from [`CheckpointError::Unavailable`]. Loaded state is
    /// structurally validated; failures surface as
    /// [`CheckpointError::Corrupt`], never silently repaired.
    fn load(
        &self,
        thread_id: &ThreadId,
    ) -> impl std::future::Future<Output = Result<Option<ConversationState>, CheckpointError>> + Send;

    /// All thread ids with a saved checkpoint, sorted.
    fn list_threads(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<ThreadId>, CheckpointError>> + Send;
}
