//! HTTP error type for the REST handlers.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use taskman_proto::api::{ErrorBody, ErrorResponse, FieldError};

/// Message returned when an edit targets a completed task.
pub const COMPLETED_TASK_MESSAGE: &str =
    "Cannot edit a completed task. Please reopen the task first by changing its status.";

/// Errors a handler can return. Each maps to one status code and an
/// `{"error": {...}}` body.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// No task with the requested id.
    #[error("Task not found")]
    NotFound,

    /// One or more fields failed validation.
    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    /// Edit attempted on a completed task without reopening it.
    #[error("Cannot edit a completed task. Please reopen the task first by changing its status.")]
    CompletedTaskLocked,

    /// Unexpected server-side failure.
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    /// Status code for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Validation(_) | Self::CompletedTaskLocked => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(vec![FieldError {
            field: "unknown".to_string(),
            message: rejection.body_text(),
            value: None,
        }])
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();
        let details = match self {
            Self::Validation(details) => Some(details),
            _ => None,
        };
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %message, "request failed");
        }
        let body = ErrorResponse {
            error: ErrorBody {
                message,
                status_code: status.as_u16(),
                details,
            },
        };
        (status, Json(body)).into_response()
    }
}
