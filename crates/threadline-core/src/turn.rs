//! Turn processor: advances a thread by exactly one request/response pair.
//!
//! `TurnService` coordinates the registry, the chat model, and the
//! checkpointer. Generic over both contracts so threadline-core never
//! depends on threadline-infra.
//!
//! Failure policy: inference failure retains the user's message but
//! appends no assistant message; a save failure after a successful
//! inference is reported as succeeded-but-unpersisted rather than
//! rolled back.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use threadline_types::config::ModelConfig;
use threadline_types::error::{ChatError, CheckpointError};
use threadline_types::model::{ChatRequest, ModelError};
use threadline_types::thread::{ConversationState, Message, ThreadId};

use crate::checkpoint::Checkpointer;
use crate::export::{export, ConversationExport};
use crate::model::ChatModel;
use crate::registry::{ThreadRegistry, ThreadSlot};

/// Inference parameters for turn processing.
#[derive(Debug, Clone)]
pub struct TurnOptions {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: Option<f64>,
    /// Upper bound on a single inference call.
    pub inference_timeout: Duration,
}

impl From<&ModelConfig> for TurnOptions {
    fn from(config: &ModelConfig) -> Self {
        Self {
            model: config.name.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            inference_timeout: Duration::from_secs(config.timeout_secs),
        }
    }
}

/// Result of one successful turn.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    /// The assistant's reply.
    pub message: Message,
    /// False when the reply was produced but the checkpoint save
    /// failed; the caller should surface a soft warning.
    pub persisted: bool,
}

/// Orchestrates turn processing across the registry, model, and store.
pub struct TurnService<C: Checkpointer, M: ChatModel> {
    registry: Arc<ThreadRegistry>,
    checkpointer: C,
    model: M,
    options: TurnOptions,
}

impl<C: Checkpointer, M: ChatModel> TurnService<C, M> {
    pub fn new(
        registry: Arc<ThreadRegistry>,
        checkpointer: C,
        model: M,
        options: TurnOptions,
    ) -> Self {
        Self {
            registry,
            checkpointer,
            model,
            options,
        }
    }

    pub fn registry(&self) -> &Arc<ThreadRegistry> {
        &self.registry
    }

    pub fn checkpointer(&self) -> &C {
        &self.checkpointer
    }

    /// Resolve a thread's slot, restoring from the checkpointer on
    /// first sight in this process.
    ///
    /// A corrupt checkpoint is logged and the thread started fresh
    /// (treated as absent, per the error policy); a store outage is
    /// surfaced so the caller can retry rather than silently forking
    /// the conversation.
    async fn resolve_slot(&self, thread_id: &ThreadId) -> Result<Arc<ThreadSlot>, ChatError> {
        if let Some(slot) = self.registry.get(thread_id) {
            return Ok(slot);
        }
        match self.checkpointer.load(thread_id).await {
            Ok(Some(state)) => Ok(self.registry.adopt(state)),
            Ok(None) => Ok(self.registry.get_or_create(thread_id)),
            Err(CheckpointError::Corrupt(reason)) => {
                error!(%thread_id, %reason, "corrupt checkpoint; starting thread fresh");
                Ok(self.registry.get_or_create(thread_id))
            }
            Err(CheckpointError::Unavailable(reason)) => {
                Err(ChatError::PersistenceUnavailable(reason))
            }
        }
    }

    /// Process one turn: append the user message, invoke the model with
    /// the full history, append the reply, checkpoint, return the reply.
    ///
    /// At most one turn per thread is in flight; a concurrent submit
    /// for the same thread fails with [`ChatError::ThreadBusy`].
    /// Timeout or cancellation of the model call leaves the registered
    /// state exactly as it was before the turn started (only a working
    /// copy is mutated until commit).
    pub async fn submit(&self, thread_id: &str, text: &str) -> Result<TurnOutcome, ChatError> {
        let thread_id: ThreadId = thread_id.parse().map_err(ChatError::InvalidThreadId)?;
        let slot = self.resolve_slot(&thread_id).await?;
        let mut guard = slot.begin_turn()?;

        let mut working = guard.clone();
        working.push_user(text);
        debug!(%thread_id, sequence = working.next_sequence() - 1, "user message appended");

        let request = ChatRequest {
            model: self.options.model.clone(),
            messages: working.messages.clone(),
            max_tokens: self.options.max_tokens,
            temperature: self.options.temperature,
        };

        let response = match timeout(self.options.inference_timeout, self.model.complete(&request))
            .await
        {
            Ok(Ok(response)) => response,
            Ok(Err(err)) => return self.fail_turn(&mut guard, working, err).await,
            Err(_) => {
                let err = ModelError::Timeout {
                    elapsed_ms: self.options.inference_timeout.as_millis() as u64,
                };
                return self.fail_turn(&mut guard, working, err).await;
            }
        };

        let reply = working.push_assistant(response.content).clone();
        *guard = working;

        let persisted = match self.checkpointer.save(&guard).await {
            Ok(()) => true,
            Err(err) => {
                warn!(%thread_id, %err, "reply produced but checkpoint save failed");
                false
            }
        };

        info!(
            %thread_id,
            sequence = reply.sequence,
            persisted,
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            "turn completed"
        );
        Ok(TurnOutcome {
            message: reply,
            persisted,
        })
    }

    /// Commit the failed turn's user message (retention policy) and
    /// surface the inference error. No assistant message is appended
    /// and no phantom reply is persisted.
    async fn fail_turn(
        &self,
        guard: &mut ConversationState,
        working: ConversationState,
        err: ModelError,
    ) -> Result<TurnOutcome, ChatError> {
        let thread_id = working.thread_id.clone();
        *guard = working;
        if let Err(save_err) = self.checkpointer.save(guard).await {
            warn!(%thread_id, %save_err, "failed to persist user message after inference failure");
        }
        warn!(%thread_id, %err, "inference failed; user message retained");
        Err(ChatError::InferenceFailed(err))
    }

    /// Ordered message history for a thread, or `None` if the thread
    /// has never been seen.
    pub async fn history(&self, thread_id: &str) -> Result<Option<Vec<Message>>, ChatError> {
        let thread_id: ThreadId = thread_id.parse().map_err(ChatError::InvalidThreadId)?;
        if let Some(slot) = self.registry.get(&thread_id) {
            return Ok(Some(slot.snapshot().await.messages));
        }
        match self.checkpointer.load(&thread_id).await {
            Ok(Some(state)) => Ok(Some(state.messages)),
            Ok(None) => Ok(None),
            Err(CheckpointError::Corrupt(reason)) => {
                error!(%thread_id, %reason, "corrupt checkpoint treated as absent");
                Ok(None)
            }
            Err(CheckpointError::Unavailable(reason)) => {
                Err(ChatError::PersistenceUnavailable(reason))
            }
        }
    }

    /// Export a thread's conversation in the stable serialized form.
    pub async fn export(&self, thread_id: &str) -> Result<Option<ConversationExport>, ChatError> {
        let thread_id: ThreadId = thread_id.parse().map_err(ChatError::InvalidThreadId)?;
        if let Some(slot) = self.registry.get(&thread_id) {
            return Ok(Some(export(&slot.snapshot().await)));
        }
        match self.checkpointer.load(&thread_id).await {
            Ok(Some(state)) => Ok(Some(export(&state))),
            Ok(None) => Ok(None),
            Err(CheckpointError::Corrupt(reason)) => {
                error!(%thread_id, %reason, "corrupt checkpoint treated as absent");
                Ok(None)
            }
            Err(CheckpointError::Unavailable(reason)) => {
                Err(ChatError::PersistenceUnavailable(reason))
            }
        }
    }

    /// Union of registered and persisted thread ids, sorted.
    pub async fn list_threads(&self) -> Result<Vec<ThreadId>, ChatError> {
        let mut ids = self.registry.thread_ids();
        let persisted = self
            .checkpointer
            .list_threads()
            .await
            .map_err(ChatError::from)?;
        ids.extend(persisted);
        ids.sort();
        ids.dedup();
        Ok(ids)
    }
}
