//! Process-wide thread registry.
//!
//! Maps thread ids to live conversation state and guarantees one state
//! object per thread id. The registry is the in-memory working set; the
//! checkpointer is the durable source of truth, and the registry can be
//! rebuilt from it after a restart via [`ThreadRegistry::hydrate`].

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{info, warn};

use threadline_types::error::{ChatError, CheckpointError};
use threadline_types::thread::{ConversationState, ThreadId};

use crate::checkpoint::Checkpointer;

/// One registered thread: its state behind the per-thread turn lock.
///
/// The mutex serializes turns: the turn processor acquires it for the
/// duration of a turn, so a second request for the same thread observes
/// contention and is rejected with [`ChatError::ThreadBusy`] instead of
/// interleaving sequence numbers.
pub struct ThreadSlot {
    state: Mutex<ConversationState>,
}

impl ThreadSlot {
    fn new(state: ConversationState) -> Self {
        Self {
            state: Mutex::new(state),
        }
    }

    /// Acquire the turn lock without waiting.
    ///
    /// Fails with `ThreadBusy` when a turn is already in flight.
    pub fn begin_turn(&self) -> Result<MutexGuard<'_, ConversationState>, ChatError> {
        self.state.try_lock().map_err(|_| ChatError::ThreadBusy)
    }

    /// Clone the current state for read-only consumers.
    ///
    /// Waits for an in-flight turn to finish its commit, then copies
    /// under the lock; the clone is released before returning so
    /// readers never hold up the next turn.
    pub async fn snapshot(&self) -> ConversationState {
        self.state.lock().await.clone()
    }
}

/// Registry of all threads known to this process.
///
/// Mutation of a given thread's entry is serialized by the per-slot
/// lock; distinct threads share no mutable state beyond the sharded
/// map itself.
#[derive(Default)]
pub struct ThreadRegistry {
    slots: DashMap<ThreadId, Arc<ThreadSlot>>,
}

impl ThreadRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pure lookup; never creates as a side effect.
    pub fn get(&self, thread_id: &ThreadId) -> Option<Arc<ThreadSlot>> {
        self.slots.get(thread_id).map(|entry| Arc::clone(&entry))
    }

    /// Return the existing slot or initialize an empty conversation.
    ///
    /// Idempotent: concurrent calls with the same id resolve to the
    /// same slot (DashMap entry API), never two distinct states.
    pub fn get_or_create(&self, thread_id: &ThreadId) -> Arc<ThreadSlot> {
        self.slots
            .entry(thread_id.clone())
            .or_insert_with(|| {
                Arc::new(ThreadSlot::new(ConversationState::new(thread_id.clone())))
            })
            .clone()
    }

    /// Register state restored from a checkpoint.
    ///
    /// If the thread raced into the registry since the load, the
    /// already-registered slot wins and the loaded copy is dropped.
    pub fn adopt(&self, state: ConversationState) -> Arc<ThreadSlot> {
        self.slots
            .entry(state.thread_id.clone())
            .or_insert_with(|| Arc::new(ThreadSlot::new(state)))
            .clone()
    }

    /// All registered thread ids, sorted.
    pub fn thread_ids(&self) -> Vec<ThreadId> {
        let mut ids: Vec<ThreadId> = self.slots.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        ids
    }

    /// Rebuild the registry from the checkpointer after a restart.
    ///
    /// Corrupt checkpoints are logged and skipped (the thread is
    /// treated as absent); a store outage aborts the rebuild.
    pub async fn hydrate<C: Checkpointer>(
        &self,
        checkpointer: &C,
    ) -> Result<usize, CheckpointError> {
        let mut restored = 0;
        for thread_id in checkpointer.list_threads().await? {
            match checkpointer.load(&thread_id).await {
                Ok(Some(state)) => {
                    self.adopt(state);
                    restored += 1;
                }
                Ok(None) => {}
                Err(CheckpointError::Corrupt(reason)) => {
                    warn!(%thread_id, %reason, "skipping corrupt checkpoint during hydrate");
                }
                Err(err @ CheckpointError::Unavailable(_)) => return Err(err),
            }
        }
        info!(restored, "thread registry hydrated from checkpointer");
        Ok(restored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tid(s: &str) -> ThreadId {
        s.parse().unwrap()
    }

    #[tokio::test]
    async fn test_get_never_creates() {
        let registry = ThreadRegistry::new();
        assert!(registry.get(&tid("t1")).is_none());
        // Still absent after the failed lookup.
        assert!(registry.get(&tid("t1")).is_none());
        assert!(registry.thread_ids().is_empty());
    }

    #[tokio::test]
    async fn test_get_or_create_is_idempotent() {
        let registry = ThreadRegistry::new();
        let a = registry.get_or_create(&tid("t1"));
        let b = registry.get_or_create(&tid("t1"));
        assert!(Arc::ptr_eq(&a, &b));

        let snap = a.snapshot().await;
        assert_eq!(snap.thread_id, tid("t1"));
        assert!(snap.messages.is_empty());
    }

    #[tokio::test]
    async fn test_adopt_keeps_existing_slot() {
        let registry = ThreadRegistry::new();
        let existing = registry.get_or_create(&tid("t1"));
        {
            let mut guard = existing.begin_turn().unwrap();
            guard.push_user("live message");
        }

        // A late restore for the same thread must not clobber the live slot.
        let stale = ConversationState::new(tid("t1"));
        let adopted = registry.adopt(stale);
        assert!(Arc::ptr_eq(&existing, &adopted));
        assert_eq!(adopted.snapshot().await.messages.len(), 1);
    }

    #[tokio::test]
    async fn test_begin_turn_rejects_second_caller() {
        let registry = ThreadRegistry::new();
        let slot = registry.get_or_create(&tid("t1"));

        let guard = slot.begin_turn().unwrap();
        assert!(matches!(slot.begin_turn(), Err(ChatError::ThreadBusy)));
        drop(guard);
        assert!(slot.begin_turn().is_ok());
    }

    #[tokio::test]
    async fn test_distinct_threads_do_not_contend() {
        let registry = ThreadRegistry::new();
        let a = registry.get_or_create(&tid("t1"));
        let b = registry.get_or_create(&tid("t2"));

        let _guard_a = a.begin_turn().unwrap();
        assert!(b.begin_turn().is_ok());
    }

    #[tokio::test]
    async fn test_thread_ids_sorted() {
        let registry = ThreadRegistry::new();
        registry.get_or_create(&tid("zeta"));
        registry.get_or_create(&tid("alpha"));
        let ids: Vec<String> = registry
            .thread_ids()
            .into_iter()
            .map(|id| id.to_string())
            .collect();
        assert_eq!(ids, vec!["alpha", "zeta"]);
    }

    #[tokio::test]
    async fn test_concurrent_get_or_create_single_slot() {
        let registry = Arc::new(ThreadRegistry::new());
        let mut handles = Vec::new();
        for _ in 0..16 {
            let registry = Arc::clone(&registry);
            handles.push(tokio::spawn(async move {
                registry.get_or_create(&"shared".parse().unwrap())
            }));
        }
        let mut slots = Vec::with_capacity(handles.len());
        for handle in handles {
            slots.push(handle.await.unwrap());
        }
        for slot in &slots[1..] {
            assert!(Arc::ptr_eq(&slots[0], slot));
        }
    }

    #[tokio::test]
    async fn test_snapshot_is_a_copy() {
        let registry = ThreadRegistry::new();
        let slot = registry.get_or_create(&tid("t1"));
        let mut snap = slot.snapshot().await;
        snap.push_user("x");
        // Mutating the snapshot leaves the slot untouched.
        assert!(slot.snapshot().await.messages.is_empty());
    }
}
