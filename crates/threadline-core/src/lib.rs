//! Core conversation logic for Threadline.
//!
//! Defines the checkpointer and chat-model contracts (implementations
//! live in threadline-infra), the process-wide thread registry, the
//! turn processor, and the export/import serialization.

pub mod checkpoint;
pub mod export;
pub mod model;
pub mod registry;
pub mod turn;
