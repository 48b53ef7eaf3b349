use crate::repository::RecordId;
use thiserror::Error;

/// Errors raised by the base62 codec.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("identifier must be non-negative, got {0}")]
    InvalidArgument(i64),
    #[error("invalid short code: {0}")]
    InvalidCode(String),
}

/// Errors reported by a [`Repository`](crate::repository::Repository) backend.
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("unique constraint violated: {0}")]
    Conflict(String),
    #[error("record not found: {0}")]
    NotFound(RecordId),
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
    #[error("storage operation timed out: {0}")]
    Timeout(String),
    #[error("storage query failed: {0}")]
    Query(String),
    #[error("stored data is invalid: {0}")]
    InvalidData(String),
    #[error("storage operation failed: {0}")]
    Operation(String),
}

impl StorageError {
    /// Whether the caller may reasonably retry the same request later.
    pub fn is_retryable(&self) -> bool {
        matches!(self, StorageError::Unavailable(_) | StorageError::Timeout(_))
    }
}

/// Errors surfaced by a [`Shortener`](crate::shortener::Shortener).
#[derive(Debug, Clone, Error)]
pub enum ShortenerError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("invalid short code: {0}")]
    InvalidCode(String),
    /// The record was inserted but its short code could not be attached.
    /// The pending row is left in place.
    #[error("record {id} is pending without a short code: {source}")]
    IncompleteRecord {
        id: RecordId,
        #[source]
        source: StorageError,
    },
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl ShortenerError {
    /// Whether the failure is transient (store unavailable or timed out).
    pub fn is_retryable(&self) -> bool {
        match self {
            ShortenerError::Storage(e) => e.is_retryable(),
            _ => false,
        }
    }
}

impl From<CodecError> for ShortenerError {
    fn from(value: CodecError) -> Self {
        match value {
            CodecError::InvalidArgument(id) => {
                Self::InvalidArgument(format!("identifier must be non-negative, got {id}"))
            }
            CodecError::InvalidCode(message) => Self::InvalidCode(message),
        }
    }
}
