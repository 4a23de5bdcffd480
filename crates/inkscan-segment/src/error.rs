//! Error types for inkscan-segment

use thiserror::Error;

/// Errors that can occur during segmentation
#[derive(Debug, Error)]
pub enum SegmentError {
    /// Core library error
    #[error("core error: {0}")]
    Core(#[from] inkscan_core::CoreError),

    /// A band lies outside the bitmap rows
    #[error("band rows {top}..{bottom} outside bitmap height {height}")]
    BandOutOfRange { top: u32, bottom: u32, height: u32 },
}

/// Result type for segmentation operations
pub type SegmentResult<T> = Result<T, SegmentError>;
