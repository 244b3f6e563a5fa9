//! Infrastructure implementations for Threadline.
//!
//! Checkpoint store backends (SQLite via sqlx, JSON-file, in-memory)
//! behind the `Checkpointer` contract from threadline-core, plus the
//! OpenAI-compatible chat-model provider used against Groq.

pub mod backend;
pub mod file;
pub mod memory;
pub mod model;
pub mod sqlite;
