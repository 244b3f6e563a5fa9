//! Application error type mapping to HTTP status codes.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use threadline_types::error::ChatError;

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// Turn processing or persistence errors.
    Chat(ChatError),
    /// The requested thread has no recorded history.
    ThreadNotFound(String),
    /// Validation error in the request itself.
    Validation(String),
}

impl From<ChatError> for AppError {
    fn from(e: ChatError) -> Self {
        AppError::Chat(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Chat(ChatError::InvalidThreadId(reason)) => (
                StatusCode::BAD_REQUEST,
                "INVALID_THREAD_ID",
                reason.clone(),
            ),
            AppError::Chat(ChatError::ThreadBusy) => (
                StatusCode::CONFLICT,
                "THREAD_BUSY",
                "a turn is already in flight for this thread".to_string(),
            ),
            AppError::Chat(ChatError::InferenceFailed(source)) => (
                StatusCode::BAD_GATEWAY,
                "INFERENCE_FAILED",
                source.to_string(),
            ),
            AppError::Chat(ChatError::PersistenceUnavailable(reason)) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "PERSISTENCE_UNAVAILABLE",
                reason.clone(),
            ),
            AppError::Chat(ChatError::CorruptCheckpoint(reason)) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "CORRUPT_CHECKPOINT",
                reason.clone(),
            ),
            AppError::ThreadNotFound(id) => (
                StatusCode::NOT_FOUND,
                "THREAD_NOT_FOUND",
                format!("thread '{id}' not found"),
            ),
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
            }
        };

        let body = json!({
            "error": {
                "code": code,
                "message": message,
            },
            "timestamp": chrono::Utc::now().to_rfc3339(),
        });

        (
            status,
            [(axum::http::header::CONTENT_TYPE, "application/json")],
            body.to_string(),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use threadline_types::model::ModelError;

    fn status_of(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_of(AppError::Chat(ChatError::InvalidThreadId("x".into()))),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(AppError::Chat(ChatError::ThreadBusy)),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(AppError::Chat(ChatError::InferenceFailed(
                ModelError::Provider {
                    message: "boom".into()
                }
            ))),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_of(AppError::Chat(ChatError::PersistenceUnavailable(
                "down".into()
            ))),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status_of(AppError::ThreadNotFound("t".into())),
            StatusCode::NOT_FOUND
        );
    }
}
