//! Shared domain types for Threadline.
//!
//! This crate holds the data shapes used across the workspace: thread
//! identifiers, messages, conversation state, chat-model request/response
//! types, the error taxonomy, and configuration. It contains no I/O and
//! no business logic beyond structural validation.

pub mod config;
pub mod error;
pub mod model;
pub mod thread;
