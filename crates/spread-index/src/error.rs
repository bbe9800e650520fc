//! Error types for the object index.

use thiserror::Error;

/// Result type alias for index operations.
pub type IndexResult<T> = Result<T, IndexError>;

/// Errors that can occur while reading or writing the index.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("failed to open index: {0}")]
    Open(String),

    #[error("transaction error: {0}")]
    Transaction(String),

    #[error("table error: {0}")]
    Table(String),

    #[error("read error: {0}")]
    Read(String),

    #[error("write error: {0}")]
    Write(String),

    #[error("serialization error: {0}")]
    Serialize(String),

    #[error("deserialization error: {0}")]
    Deserialize(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid object: {0}")]
    InvalidObject(String),
}

impl IndexError {
    /// Whether this error means the object simply is not in the index.
    pub fn is_not_found(&self) -> bool {
        matches!(self, IndexError::NotFound(_))
    }
}
