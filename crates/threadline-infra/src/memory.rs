//! In-memory checkpoint store.
//!
//! Process-local only: state is lost on exit. Useful for development
//! and for deployments that deliberately keep conversations ephemeral.

use dashmap::DashMap;

use threadline_core::checkpoint::Checkpointer;
use threadline_types::error::CheckpointError;
use threadline_types::thread::{ConversationState, ThreadId};

/// Checkpointer backed by a concurrent in-process map.
///
/// Save replaces the whole entry and load clones it, so a reader never
/// observes a partially written sequence (the DashMap shard lock covers
/// each operation).
#[derive(Default)]
pub struct MemoryCheckpointer {
    threads: DashMap<ThreadId, ConversationState>,
}

impl MemoryCheckpointer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Checkpointer for MemoryCheckpointer {
    async fn save(&self, state: &ConversationState) -> Result<(), CheckpointError> {
        self.threads.insert(state.thread_id.clone(), state.clone());
        Ok(())
    }

    async fn load(
        &self,
        thread_id: &ThreadId,
    ) -> Result<Option<ConversationState>, CheckpointError> {
        Ok(self.threads.get(thread_id).map(|entry| entry.clone()))
    }

    async fn list_threads(&self) -> Result<Vec<ThreadId>, CheckpointError> {
        let mut ids: Vec<ThreadId> = self.threads.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_with_turn(id: &str) -> ConversationState {
        let mut state = ConversationState::new(id.parse().unwrap());
        state.push_user("hi");
        state.push_assistant("hello");
        state
    }

    #[tokio::test]
    async fn test_save_load_roundtrip() {
        let store = MemoryCheckpointer::new();
        let state = state_with_turn("t1");
        store.save(&state).await.unwrap();

        let loaded = store.load(&"t1".parse().unwrap()).await.unwrap().unwrap();
        assert_eq!(loaded, state);
    }

    #[tokio::test]
    async fn test_never_saved_thread_is_absent() {
        let store = MemoryCheckpointer::new();
        let loaded = store.load(&"unknown".parse().unwrap()).await.unwrap();
        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn test_save_replaces_previous_checkpoint() {
        let store = MemoryCheckpointer::new();
        let mut state = state_with_turn("t1");
        store.save(&state).await.unwrap();

        state.push_user("more");
        store.save(&state).await.unwrap();

        let loaded = store.load(&"t1".parse().unwrap()).await.unwrap().unwrap();
        assert_eq!(loaded.messages.len(), 3);
    }

    #[tokio::test]
    async fn test_list_threads_sorted() {
        let store = MemoryCheckpointer::new();
        store.save(&state_with_turn("zeta")).await.unwrap();
        store.save(&state_with_turn("alpha")).await.unwrap();

        let ids: Vec<String> = store
            .list_threads()
            .await
            .unwrap()
            .into_iter()
            .map(|id| id.to_string())
            .collect();
        assert_eq!(ids, vec!["alpha", "zeta"]);
    }

    #[tokio::test]
    async fn test_loaded_state_is_a_copy() {
        let store = MemoryCheckpointer::new();
        store.save(&state_with_turn("t1")).await.unwrap();

        let mut loaded = store.load(&"t1".parse().unwrap()).await.unwrap().unwrap();
        loaded.push_user("mutation");

        let reloaded = store.load(&"t1".parse().unwrap()).await.unwrap().unwrap();
        assert_eq!(reloaded.messages.len(), 2);
    }
}
