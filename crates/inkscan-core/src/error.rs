//! Error types for inkscan-core

use thiserror::Error;

/// Errors that can occur in core data-structure operations
#[derive(Debug, Error)]
pub enum CoreError {
    /// Invalid bitmap dimensions
    #[error("invalid bitmap dimensions: {width}x{height}")]
    InvalidDimension { width: u32, height: u32 },

    /// Coordinate outside the bitmap bounds
    #[error("coordinate out of bounds: ({x}, {y}) in {width}x{height}")]
    OutOfBounds {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },

    /// A region must contain at least one pixel
    #[error("region has no pixels")]
    EmptyRegion,

    /// A profile cannot be finalized without samples
    #[error("profile '{0}' has no accumulated samples")]
    EmptyProfile(String),
}

/// Result type for core operations
pub type CoreResult<T> = Result<T, CoreError>;
