//! inkscan Segment - Connected-component and text-band segmentation
//!
//! This crate turns a binary pixel grid into the units the recognition
//! pipeline works with:
//!
//! - [`extract_regions`] / [`extract_regions_in`] - consuming 8-way flood
//!   fill producing one [`inkscan_core::Region`] per maximal ink blob
//! - [`detect_bands`] / [`RowBand`] - whole-line vertical bands found by
//!   empty-row scanning, with detached-dot merge-down

pub mod bands;
pub mod error;
pub mod floodfill;

pub use bands::{RowBand, detect_bands};
pub use error::{SegmentError, SegmentResult};
pub use floodfill::{extract_regions, extract_regions_in};
