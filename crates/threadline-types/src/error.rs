use thiserror::Error;

use crate::model::ModelError;

/// Errors from checkpoint store operations.
///
/// `Unavailable` and a legitimate absent result (`Ok(None)` from a
/// load) are distinct outcomes: callers retry the former and treat the
/// latter as a new thread.
#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("checkpoint store unavailable: {0}")]
    Unavailable(String),

    /// Persisted data failed structural validation. Non-retriable for
    /// that checkpoint; callers treat the thread as absent and log the
    /// corruption, never auto-repair it.
    #[error("corrupt checkpoint: {0}")]
    Corrupt(String),
}

/// Errors reported to the display adapter for a single turn.
///
/// All variants are typed results, never a process crash; one thread's
/// failure must not affect other threads.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("invalid thread id: {0}")]
    InvalidThreadId(String),

    #[error("a turn is already in flight for this thread")]
    ThreadBusy,

    #[error("inference failed")]
    InferenceFailed(#[source] ModelError),

    #[error("checkpoint store unavailable: {0}")]
    PersistenceUnavailable(String),

    #[error("corrupt checkpoint: {0}")]
    CorruptCheckpoint(String),
}

impl From<CheckpointError> for ChatError {
    fn from(e: CheckpointError) -> Self {
        match e {
            CheckpointError::Unavailable(reason) => ChatError::PersistenceUnavailable(reason),
            CheckpointError::Corrupt(reason) => ChatError::CorruptCheckpoint(reason),
        }
    }
}
