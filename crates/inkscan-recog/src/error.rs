//! Error types for inkscan-recog

use thiserror::Error;

/// Errors that can occur during recognition and training
#[derive(Debug, Error)]
pub enum RecogError {
    /// Core library error
    #[error("core error: {0}")]
    Core(#[from] inkscan_core::CoreError),

    /// Segmentation error
    #[error("segment error: {0}")]
    Segment(#[from] inkscan_segment::SegmentError),

    /// Profile store error
    #[error("store error: {0}")]
    Store(#[from] inkscan_store::StoreError),

    /// Scanning requires a completed training run
    #[error("profile library is not trained")]
    Untrained,

    /// Training input did not match the reference string
    #[error("training error: {0}")]
    Training(String),
}

/// Result type for recognition operations
pub type RecogResult<T> = Result<T, RecogError>;
