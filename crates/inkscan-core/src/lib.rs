//! inkscan Core - Basic data structures for the OCR engine
//!
//! This crate provides the fundamental data structures used throughout
//! the inkscan character recognition engine:
//!
//! - [`Bitmap`] - Binary pixel grid (true = ink)
//! - [`Rect`] - Integer rectangle regions
//! - [`Region`] - A connected ink component with a merge counter
//! - [`FeatureVector`] - The 17-value geometric fingerprint of a region
//! - [`CharacterVariant`] / [`MetaClass`] - Trained-shape identity keys
//! - [`ProfileBuilder`] / [`TrainedProfile`] - Accumulating and finalized
//!   per-variant statistics

pub mod bitmap;
pub mod charset;
pub mod error;
pub mod features;
pub mod geom;
pub mod profile;
pub mod region;

pub use bitmap::Bitmap;
pub use charset::{CharacterVariant, MetaClass, MOD_BASE, MOD_STEM};
pub use error::{CoreError, CoreResult};
pub use features::{FEATURE_LEN, FeatureVector, average_features};
pub use geom::Rect;
pub use profile::{ProfileBuilder, TrainedProfile};
pub use region::Region;
