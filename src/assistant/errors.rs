//! Assistant core error types.

use thiserror::Error;

/// Errors from the training-corpus store and corpus loading.
///
/// A turn itself never fails with these: the resolver is infallible and
/// provider outages are answered in-band.
#[derive(Debug, Error)]
pub enum AssistantError {
    /// Database operation failed.
    #[error("database error: {reason}")]
    DatabaseError { reason: String },

    /// Reading a seed file failed.
    #[error("failed to read {path}: {reason}")]
    IoError { path: String, reason: String },

    /// A stored row or seed file could not be (de)serialized.
    #[error("serialization error: {reason}")]
    SerializationError { reason: String },

    /// A training example is unusable (e.g., blank input).
    #[error("invalid training example: {reason}")]
    InvalidExample { reason: String },
}

impl From<rusqlite::Error> for AssistantError {
    fn from(e: rusqlite::Error) -> Self {
        AssistantError::DatabaseError {
            reason: e.to_string(),
        }
    }
}

impl From<serde_json::Error> for AssistantError {
    fn from(e: serde_json::Error) -> Self {
        AssistantError::SerializationError {
            reason: e.to_string(),
        }
    }
}

impl From<serde_yaml::Error> for AssistantError {
    fn from(e: serde_yaml::Error) -> Self {
        AssistantError::SerializationError {
            reason: e.to_string(),
        }
    }
}
