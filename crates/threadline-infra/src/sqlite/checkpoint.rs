//! SQLite checkpoint store implementation.
//!
//! Implements `Checkpointer` from `threadline-core` using sqlx with the
//! split read/write pool: raw queries, private Row structs, and a
//! single writer transaction per save (delete-and-reinsert of the
//! thread's message rows, so a save is all-or-nothing with respect to a
//! concurrent load).

use chrono::Utc;
use sqlx::Row;

use threadline_core::checkpoint::Checkpointer;
use threadline_types::error::CheckpointError;
use threadline_types::thread::{ConversationState, Message, MessageRole, ThreadId};

use super::pool::DatabasePool;

/// SQLite-backed implementation of `Checkpointer`.
pub struct SqliteCheckpointer {
    pool: DatabasePool,
}

impl SqliteCheckpointer {
    /// Create a new checkpoint store backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

fn unavailable(err: sqlx::Error) -> CheckpointError {
    CheckpointError::Unavailable(err.to_string())
}

/// Internal row type for mapping SQLite rows to domain Message.
struct MessageRow {
    role: String,
    content: String,
    sequence: i64,
}

impl MessageRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            role: row.try_get("role")?,
            content: row.try_get("content")?,
            sequence: row.try_get("sequence")?,
        })
    }

    fn into_message(self) -> Result<Message, CheckpointError> {
        let role: MessageRole = self
            .role
            .parse()
            .map_err(|e: String| CheckpointError::Corrupt(e))?;
        if self.sequence < 0 {
            return Err(CheckpointError::Corrupt(format!(
                "negative sequence number {}",
                self.sequence
            )));
        }
        Ok(Message {
            role,
            content: self.content,
            sequence: self.sequence as u64,
        })
    }
}

impl Checkpointer for SqliteCheckpointer {
    async fn save(&self, state: &ConversationState) -> Result<(), CheckpointError> {
        let metadata = serde_json::to_string(&state.metadata)
            .map_err(|e| CheckpointError::Unavailable(format!("metadata serialize: {e}")))?;

        let mut tx = self.pool.writer.begin().await.map_err(unavailable)?;

        sqlx::query(
            "INSERT INTO threads (thread_id, metadata, updated_at) VALUES (?, ?, ?)
             ON CONFLICT(thread_id) DO UPDATE SET metadata = excluded.metadata,
                                                  updated_at = excluded.updated_at",
        )
        .bind(state.thread_id.as_str())
        .bind(&metadata)
        .bind(Utc::now().to_rfc3339())
        .execute(&mut *tx)
        .await
        .map_err(unavailable)?;

        sqlx::query("DELETE FROM messages WHERE thread_id = ?")
            .bind(state.thread_id.as_str())
            .execute(&mut *tx)
            .await
            .map_err(unavailable)?;

        for message in &state.messages {
            sqlx::query(
                "INSERT INTO messages (thread_id, sequence, role, content) VALUES (?, ?, ?, ?)",
            )
            .bind(state.thread_id.as_str())
            .bind(message.sequence as i64)
            .bind(message.role.to_string())
            .bind(&message.content)
            .execute(&mut *tx)
            .await
            .map_err(unavailable)?;
        }

        tx.commit().await.map_err(unavailable)
    }

    async fn load(
        &self,
        thread_id: &ThreadId,
    ) -> Result<Option<ConversationState>, CheckpointError> {
        let thread_row = sqlx::query("SELECT metadata FROM threads WHERE thread_id = ?")
            .bind(thread_id.as_str())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(unavailable)?;

        let Some(thread_row) = thread_row else {
            return Ok(None);
        };

        let metadata_json: String = thread_row.try_get("metadata").map_err(unavailable)?;
        let metadata = serde_json::from_str(&metadata_json)
            .map_err(|e| CheckpointError::Corrupt(format!("undecodable metadata: {e}")))?;

        let rows = sqlx::query(
            "SELECT role, content, sequence FROM messages WHERE thread_id = ? ORDER BY sequence",
        )
        .bind(thread_id.as_str())
        .fetch_all(&self.pool.reader)
        .await
        .map_err(unavailable)?;

        let mut messages = Vec::with_capacity(rows.len());
        for row in &rows {
            let message = MessageRow::from_row(row)
                .map_err(unavailable)?
                .into_message()?;
            messages.push(message);
        }

        let state = ConversationState {
            thread_id: thread_id.clone(),
            messages,
            metadata,
        };
        state.validate().map_err(CheckpointError::Corrupt)?;
        Ok(Some(state))
    }

    async fn list_threads(&self) -> Result<Vec<ThreadId>, CheckpointError> {
        let rows = sqlx::query("SELECT thread_id FROM threads ORDER BY thread_id")
            .fetch_all(&self.pool.reader)
            .await
            .map_err(unavailable)?;

        let mut ids = Vec::with_capacity(rows.len());
        for row in &rows {
            let raw: String = row.try_get("thread_id").map_err(unavailable)?;
            let id = raw
                .parse::<ThreadId>()
                .map_err(CheckpointError::Corrupt)?;
            ids.push(id);
        }
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_store() -> (tempfile::TempDir, SqliteCheckpointer) {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("test.db").display());
        let pool = DatabasePool::new(&url).await.unwrap();
        (dir, SqliteCheckpointer::new(pool))
    }

    fn state_with_turn(id: &str) -> ConversationState {
        let mut state = ConversationState::new(id.parse().unwrap());
        state.push_user("hi");
        state.push_assistant("hello");
        state
    }

    #[tokio::test]
    async fn test_save_load_roundtrip() {
        let (_dir, store) = test_store().await;
        let state = state_with_turn("t1");
        store.save(&state).await.unwrap();

        let loaded = store.load(&"t1".parse().unwrap()).await.unwrap().unwrap();
        assert_eq!(loaded, state);
    }

    #[tokio::test]
    async fn test_never_saved_thread_is_absent() {
        let (_dir, store) = test_store().await;
        assert!(store
            .load(&"unknown-thread".parse().unwrap())
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_save_replaces_previous_checkpoint() {
        let (_dir, store) = test_store().await;
        let mut state = state_with_turn("t1");
        store.save(&state).await.unwrap();

        state.push_user("more");
        state.push_assistant("sure");
        store.save(&state).await.unwrap();

        let loaded = store.load(&"t1".parse().unwrap()).await.unwrap().unwrap();
        assert_eq!(loaded.messages.len(), 4);
        let sequences: Vec<u64> = loaded.messages.iter().map(|m| m.sequence).collect();
        assert_eq!(sequences, vec![0, 1, 2, 3]);
    }

    #[tokio::test]
    async fn test_metadata_roundtrips() {
        let (_dir, store) = test_store().await;
        let mut state = state_with_turn("t1");
        state
            .metadata
            .insert("note".to_string(), serde_json::json!({"nested": true}));
        store.save(&state).await.unwrap();

        let loaded = store.load(&"t1".parse().unwrap()).await.unwrap().unwrap();
        assert_eq!(loaded.metadata, state.metadata);
    }

    #[tokio::test]
    async fn test_list_threads_sorted() {
        let (_dir, store) = test_store().await;
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
    async fn test_tampered_rows_surface_as_corrupt() {
        let (_dir, store) = test_store().await;
        store.save(&state_with_turn("t1")).await.unwrap();

        // Corrupt a row behind the store's back. The schema CHECK guards
        // normal writes, so disable it for the tampering update.
        sqlx::query("PRAGMA ignore_check_constraints = ON")
            .execute(&store.pool.writer)
            .await
            .unwrap();
        sqlx::query("UPDATE messages SET role = 'robot' WHERE thread_id = 't1' AND sequence = 1")
            .execute(&store.pool.writer)
            .await
            .unwrap();

        let err = store.load(&"t1".parse().unwrap()).await.unwrap_err();
        assert!(matches!(err, CheckpointError::Corrupt(_)));
    }

    #[tokio::test]
    async fn test_threads_are_isolated() {
        let (_dir, store) = test_store().await;
        store.save(&state_with_turn("t1")).await.unwrap();
        store.save(&state_with_turn("t2")).await.unwrap();

        let mut t1 = store.load(&"t1".parse().unwrap()).await.unwrap().unwrap();
        t1.push_user("only t1");
        store.save(&t1).await.unwrap();

        let t2 = store.load(&"t2".parse().unwrap()).await.unwrap().unwrap();
        assert_eq!(t2.messages.len(), 2);
    }
}
