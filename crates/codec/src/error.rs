//! Codec errors.

use std::sync::Arc;

/// Errors raised by the built-in serializers.
///
/// Cheap to clone so a failed encode can be replayed to every observer of a
/// unit of work.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CodecError {
    /// JSON encoding failed.
    #[error("JSON error: {0}")]
    Json(Arc<serde_json::Error>),

    /// Any other encoding failure.
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for CodecError {
    fn from(error: serde_json::Error) -> Self {
        CodecError::Json(Arc::new(error))
    }
}

impl PartialEq for CodecError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (CodecError::Json(a), CodecError::Json(b)) => {
                Arc::ptr_eq(a, b) || a.to_string() == b.to_string()
            }
            (CodecError::Other(a), CodecError::Other(b)) => a == b,
            _ => false,
        }
    }
}
