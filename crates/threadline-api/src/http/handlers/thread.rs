//! Thread and turn HTTP handlers.
//!
//! Endpoints:
//! - GET  /api/v1/threads                - List known thread IDs
//! - POST /api/v1/threads/{id}/messages  - Submit a user turn
//! - GET  /api/v1/threads/{id}/messages  - Full transcript for a thread
//! - GET  /api/v1/threads/{id}/export    - Portable export document

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use threadline_core::export::ConversationExport;
use threadline_types::thread::Message;

use crate::http::error::AppError;
use crate::state::AppState;

/// Request body for submitting a turn.
#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    /// The user's message text.
    pub message: String,
}

/// Response body for a completed turn.
#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    /// The assistant's reply text.
    pub reply: String,
    /// Sequence number assigned to the reply within the thread.
    pub sequence: u64,
    /// False when the reply was produced but could not be checkpointed.
    pub persisted: bool,
}

/// POST /api/v1/threads/{id}/messages - Run one turn on a thread.
pub async fn submit_message(
    State(state): State<AppState>,
    Path(thread_id): Path<String>,
    Json(body): Json<SubmitRequest>,
) -> Result<Json<SubmitResponse>, AppError> {
    if body.message.trim().is_empty() {
        return Err(AppError::Validation("message must not be empty".into()));
    }

    let outcome = state.turns.submit(&thread_id, &body.message).await?;

    Ok(Json(SubmitResponse {
        reply: outcome.message.content,
        sequence: outcome.message.sequence,
        persisted: outcome.persisted,
    }))
}

/// GET /api/v1/threads/{id}/messages - Full transcript for a thread.
pub async fn get_messages(
    State(state): State<AppState>,
    Path(thread_id): Path<String>,
) -> Result<Json<Vec<Message>>, AppError> {
    match state.turns.history(&thread_id).await? {
        Some(messages) => Ok(Json(messages)),
        None => Err(AppError::ThreadNotFound(thread_id)),
    }
}

/// GET /api/v1/threads/{id}/export - Portable export document.
pub async fn export_thread(
    State(state): State<AppState>,
    Path(thread_id): Path<String>,
) -> Result<Json<ConversationExport>, AppError> {
    match state.turns.export(&thread_id).await? {
        Some(doc) => Ok(Json(doc)),
        None => Err(AppError::ThreadNotFound(thread_id)),
    }
}

/// GET /api/v1/threads - Sorted list of known thread IDs.
pub async fn list_threads(
    State(state): State<AppState>,
) -> Result<Json<Vec<String>>, AppError> {
    let ids = state.turns.list_threads().await?;
    Ok(Json(ids.into_iter().map(|id| id.to_string()).collect()))
}
