//! inkscan - Trainable geometric OCR engine
//!
//! inkscan recognizes machine-printed text in binary images using trained
//! per-font character profiles:
//!
//! - connected-component segmentation (consuming 8-way flood fill)
//! - 17-value geometric feature vectors per region
//! - nearest-profile classification with a size-based tie-break
//! - a priority-ordered merge engine reassembling compound glyphs
//!   (`i`, `j`, `;`, `!`, `?`, `:`, `=`, `"`, `%`)
//! - line assembly with gap-based space synthesis
//! - training from a synthetic reference image, with an iterative
//!   correction loop that repairs or excludes misclassifying profiles
//!
//! # Example
//!
//! ```
//! use inkscan::{Bitmap, recog::EngineOptions};
//!
//! // An empty page: valid input to every pipeline stage
//! let bitmap = Bitmap::new(64, 32).unwrap();
//! let options = EngineOptions::default();
//! assert_eq!(bitmap.count_ink(), 0);
//! assert_eq!(options.size_ratio_weight, 1.0);
//! ```

// Re-export core types (primary data structures used everywhere)
pub use inkscan_core::*;

// Re-export domain crates as modules to avoid name conflicts
pub use inkscan_io as io;
pub use inkscan_recog as recog;
pub use inkscan_segment as segment;
pub use inkscan_store as store;
