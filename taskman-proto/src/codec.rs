//! JSON serialization for Taskman wire and storage formats.
//!
//! Both the REST API and the client's persistent storage carry JSON text.
//! These helpers wrap `serde_json` behind a single [`CodecError`] so callers
//! do not depend on the serializer's error type.

use serde::Serialize;
use serde::de::DeserializeOwned;

/// Error type for codec encode/decode operations.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// Serialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),
    /// Input was not valid JSON for the requested type.
    #[error("malformed data: {0}")]
    Malformed(String),
}

/// Encodes a value as compact JSON text.
///
/// # Errors
///
/// Returns `CodecError::Serialization` if the value cannot be serialized.
pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<String, CodecError> {
    serde_json::to_string(value).map_err(|e| CodecError::Serialization(e.to_string()))
}

/// Decodes a value from JSON text.
///
/// # Errors
///
/// Returns `CodecError::Malformed` if the text is not valid JSON or does not
/// match the shape of `T`.
pub fn decode<T: DeserializeOwned>(text: &str) -> Result<T, CodecError> {
    serde_json::from_str(text).map_err(|e| CodecError::Malformed(e.to_string()))
}
