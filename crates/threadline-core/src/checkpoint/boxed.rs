//! BoxCheckpointer -- object-safe dynamic dispatch wrapper for Checkpointer.
//!
//! The checkpoint backend is selected at runtime from configuration
//! (sqlite, file, or memory), so the turn service needs a type-erased
//! handle. RPITIT traits are not object-safe; the usual workaround:
//! 1. Define an object-safe `CheckpointerDyn` trait with boxed futures
//! 2. Blanket-impl `CheckpointerDyn` for all `T: Checkpointer`
//! 3. `BoxCheckpointer` wraps `Box<dyn CheckpointerDyn>` and implements
//!    `Checkpointer` itself so it slots into generic call sites.

use std::future::Future;
use std::pin::Pin;

use threadline_types::error::CheckpointError;
use threadline_types::thread::{ConversationState, ThreadId};

use super::Checkpointer;

/// Object-safe version of [`Checkpointer`] with boxed futures.
pub trait CheckpointerDyn: Send + Sync {
    fn save_boxed<'a>(
        &'a self,
        state: &'a ConversationState,
    ) -> Pin<Box<dyn Future<Output = Result<(), CheckpointError>> + Send + 'a>>;

    fn load_boxed<'a>(
        &'a self,
        thread_id: &'a ThreadId,
    ) -> Pin<Box<dyn Future<Output = Result<Option<ConversationState>, CheckpointError>> + Send + 'a>>;

    fn list_threads_boxed<'a>(
        &'a self,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<ThreadId>, CheckpointError>> + Send + 'a>>;
}

/// Blanket implementation: any `Checkpointer` is a `CheckpointerDyn`.
impl<T: Checkpointer> CheckpointerDyn for T {
    fn save_boxed<'a>(
        &'a self,
        state: &'a ConversationState,
    ) -> Pin<Box<dyn Future<Output = Result<(), CheckpointError>> + Send + 'a>> {
        Box::pin(self.save(state))
    }

    fn load_boxed<'a>(
        &'a self,
        thread_id: &'a ThreadId,
    ) -> Pin<Box<dyn Future<Output = Result<Option<ConversationState>, CheckpointError>> + Send + 'a>>
    {
        Box::pin(self.load(thread_id))
    }

    fn list_threads_boxed<'a>(
        &'a self,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<ThreadId>, CheckpointError>> + Send + 'a>> {
        Box::pin(self.list_threads())
    }
}

/// Type-erased checkpoint store for runtime backend selection.
pub struct BoxCheckpointer {
    inner: Box<dyn CheckpointerDyn + Send + Sync>,
}

impl BoxCheckpointer {
    /// Wrap a concrete `Checkpointer` in a type-erased box.
    pub fn new<T: Checkpointer + 'static>(checkpointer: T) -> Self {
        Self {
            inner: Box::new(checkpointer),
        }
    }
}

impl Checkpointer for BoxCheckpointer {
    async fn save(&self, state: &ConversationState) -> Result<(), CheckpointError> {
        self.inner.save_boxed(state).await
    }

    async fn load(
        &self,
        thread_id: &ThreadId,
    ) -> Result<Option<ConversationState>, CheckpointError> {
        self.inner.load_boxed(thread_id).await
    }

    async fn list_threads(&self) -> Result<Vec<ThreadId>, CheckpointError> {
        self.inner.list_threads_boxed().await
    }
}
