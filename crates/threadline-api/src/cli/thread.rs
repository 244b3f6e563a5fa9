//! Thread CLI commands: send, history, export, threads.

use anyhow::{bail, Context, Result};
use uuid::Uuid;

use threadline_types::thread::MessageRole;

use crate::state::AppState;

/// Run one turn on a thread, printing the assistant's reply.
///
/// When no thread is given, starts a fresh one under a random UUID and
/// prints its id so the conversation can be continued.
pub async fn send(
    state: &AppState,
    thread: Option<String>,
    message: &str,
    json: bool,
) -> Result<()> {
    let fresh = thread.is_none();
    let thread_id = thread.unwrap_or_else(|| Uuid::new_v4().to_string());

    let outcome = state
        .turns
        .submit(&thread_id, message)
        .await
        .with_context(|| format!("turn failed on thread '{thread_id}'"))?;

    if json {
        let doc = serde_json::json!({
            "thread_id": thread_id,
            "reply": outcome.message.content,
            "sequence": outcome.message.sequence,
            "persisted": outcome.persisted,
        });
        println!("{}", serde_json::to_string_pretty(&doc)?);
        return Ok(());
    }

    if fresh {
        println!("thread: {thread_id}");
    }
    println!("{}", outcome.message.content);
    if !outcome.persisted {
        eprintln!("warning: reply was not checkpointed; it may be lost on restart");
    }

    Ok(())
}

/// Print the full transcript of a thread.
pub async fn history(state: &AppState, thread: &str, json: bool) -> Result<()> {
    let Some(messages) = state.turns.history(thread).await? else {
        bail!("thread '{thread}' not found");
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&messages)?);
        return Ok(());
    }

    for message in &messages {
        let speaker = match message.role {
            MessageRole::System => "system",
            MessageRole::User => "you",
            MessageRole::Assistant => "assistant",
        };
        println!("[{}] {speaker}: {}", message.sequence, message.content);
    }

    Ok(())
}

/// Print a thread's portable export document.
///
/// Always JSON; the document is the interchange format itself.
pub async fn export(state: &AppState, thread: &str) -> Result<()> {
    let Some(doc) = state.turns.export(thread).await? else {
        bail!("thread '{thread}' not found");
    };
    println!("{}", serde_json::to_string_pretty(&doc)?);
    Ok(())
}

/// List known thread IDs, one per line.
pub async fn list(state: &AppState, json: bool) -> Result<()> {
    let ids: Vec<String> = state
        .turns
        .list_threads()
        .await?
        .into_iter()
        .map(|id| id.to_string())
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&ids)?);
        return Ok(());
    }

    if ids.is_empty() {
        eprintln!("no threads yet; start one with: tline send \"hello\"");
        return Ok(());
    }
    for id in ids {
        println!("{id}");
    }

    Ok(())
}
