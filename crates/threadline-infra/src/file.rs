//! JSON-file checkpoint store.
//!
//! One document per thread, `<thread_id>.json`, in the stable export
//! format (so checkpoint files double as portable exports). The thread
//! id character set guarantees path safety.
//!
//! Atomicity: each save writes to a `.tmp` sibling and renames it over
//! the final path. Rename is atomic on the same filesystem, so a
//! concurrent load sees either the previous checkpoint or the new one,
//! never a torn file.

use std::path::{Path, PathBuf};

use tracing::warn;

use threadline_core::checkpoint::Checkpointer;
use threadline_core::export::{self, ConversationExport};
use threadline_types::error::CheckpointError;
use threadline_types::thread::{ConversationState, ThreadId};

/// Checkpointer backed by a directory of JSON documents.
pub struct JsonFileCheckpointer {
    dir: PathBuf,
}

impl JsonFileCheckpointer {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn thread_path(&self, thread_id: &ThreadId) -> PathBuf {
        self.dir.join(format!("{thread_id}.json"))
    }

    fn unavailable(err: std::io::Error) -> CheckpointError {
        CheckpointError::Unavailable(err.to_string())
    }
}

impl Checkpointer for JsonFileCheckpointer {
    async fn save(&self, state: &ConversationState) -> Result<(), CheckpointError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(Self::unavailable)?;

        let doc = export::export(state);
        let json = serde_json::to_vec_pretty(&doc)
            .map_err(|e| CheckpointError::Unavailable(format!("serialize failed: {e}")))?;

        let final_path = self.thread_path(&state.thread_id);
        let tmp_path = final_path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, &json)
            .await
            .map_err(Self::unavailable)?;
        tokio::fs::rename(&tmp_path, &final_path)
            .await
            .map_err(Self::unavailable)?;
        Ok(())
    }

    async fn load(
        &self,
        thread_id: &ThreadId,
    ) -> Result<Option<ConversationState>, CheckpointError> {
        let path = self.thread_path(thread_id);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Self::unavailable(e)),
        };

        let doc: ConversationExport = serde_json::from_slice(&bytes)
            .map_err(|e| CheckpointError::Corrupt(format!("undecodable checkpoint: {e}")))?;
        if doc.thread_id != thread_id.as_str() {
            return Err(CheckpointError::Corrupt(format!(
                "checkpoint file for '{thread_id}' names thread '{}'",
                doc.thread_id
            )));
        }
        let state =
            export::import(doc).map_err(|e| CheckpointError::Corrupt(e.to_string()))?;
        Ok(Some(state))
    }

    async fn list_threads(&self) -> Result<Vec<ThreadId>, CheckpointError> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Self::unavailable(e)),
        };

        let mut ids = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(Self::unavailable)? {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            let Some(stem) = name.strip_suffix(".json") else {
                continue; // ignores .tmp leftovers from interrupted saves
            };
            match stem.parse::<ThreadId>() {
                Ok(id) => ids.push(id),
                Err(reason) => {
                    warn!(file = name, %reason, "ignoring file with invalid thread id");
                }
            }
        }
        ids.sort();
        Ok(ids)
    }
}
