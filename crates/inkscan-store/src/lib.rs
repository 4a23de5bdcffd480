//! inkscan Store - Trained-profile persistence boundary
//!
//! The recognition engine never owns a file or database format; it talks
//! to a [`ProfileStore`]. A store instance is already scoped to one font
//! bucket — bucket selection happens where the store is constructed, by
//! the caller. Two implementations are provided:
//!
//! - [`MemoryStore`] - in-process maps, used by tests and as training
//!   scratch space
//! - [`JsonStore`] - one JSON document per font bucket, written through
//!   on every mutation
//!
//! All operations are idempotent and safe to retry.

mod error;
mod json;
mod memory;

pub use error::{StoreError, StoreResult};
pub use json::JsonStore;
pub use memory::MemoryStore;

use inkscan_core::TrainedProfile;

/// Persistence interface for one font bucket's trained state
pub trait ProfileStore {
    /// Loads every trained profile in the bucket
    fn load_profiles(&self) -> StoreResult<Vec<TrainedProfile>>;

    /// Saves one profile, replacing any previous profile with the same key
    fn save_profile(&mut self, profile: &TrainedProfile) -> StoreResult<()>;

    /// Loads a named scalar statistic (merge distance ratios and the like)
    fn load_scalar(&self, name: &str) -> StoreResult<Option<f64>>;

    /// Saves a named scalar statistic
    fn save_scalar(&mut self, name: &str, value: f64) -> StoreResult<()>;

    /// Loads the custom trailing-space ratio measured for one letter
    fn load_custom_space(&self, letter: char) -> StoreResult<Option<f64>>;

    /// Saves the custom trailing-space ratio for one letter
    fn save_custom_space(&mut self, letter: char, ratio: f64) -> StoreResult<()>;

    /// Enumerates all stored custom-space ratios
    fn custom_spaces(&self) -> StoreResult<Vec<(char, f64)>>;

    /// True once a training run has completed for this bucket
    fn is_trained(&self) -> StoreResult<bool>;

    /// Marks the bucket trained (or clears the mark)
    fn set_trained(&mut self, trained: bool) -> StoreResult<()>;
}
