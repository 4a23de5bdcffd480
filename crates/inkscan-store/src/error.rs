//! Error types for inkscan-store

use thiserror::Error;

/// Errors that can occur in profile persistence
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem error
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Document (de)serialization error
    #[error("store document error: {0}")]
    Document(#[from] serde_json::Error),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;
