//! HTTP/REST API layer for Threadline.
//!
//! Axum-based REST API at `/api/v1/` with CORS support and
//! per-request tracing.

pub mod error;
pub mod handlers;
pub mod router;
