//! HTTP request handlers.

pub mod thread;
