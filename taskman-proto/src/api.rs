//! REST envelopes shared by the server handlers and the HTTP client.
//!
//! Every successful body is either `{"data": ...}` or `{"message": ...}`;
//! every error body is `{"error": {"message": ..., "statusCode": ...}}`.

use serde::{Deserialize, Serialize};

/// Success envelope carrying a payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataResponse<T> {
    /// The payload.
    pub data: T,
}

impl<T> DataResponse<T> {
    /// Wraps a payload.
    pub const fn new(data: T) -> Self {
        Self { data }
    }
}

/// Success envelope carrying a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    /// The message, e.g. `Task deleted successfully`.
    pub message: String,
}

/// A single field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Offending field name (`unknown` when it cannot be attributed).
    pub field: String,
    /// What was wrong.
    pub message: String,
    /// The rejected value, if it is worth echoing back.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
}

/// Inner error object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    /// Human-readable message.
    pub message: String,
    /// HTTP status code, repeated in the body.
    pub status_code: u16,
    /// Per-field validation details.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<FieldError>>,
}

/// Error envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// The error.
    pub error: ErrorBody,
}

/// Body of `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `ok` when the server answers.
    pub status: String,
    /// Server time when the probe was answered.
    pub timestamp: chrono::DateTime<chrono::Utc>,
}
