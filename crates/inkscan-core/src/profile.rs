//! Trained character profiles
//!
//! Training accumulates raw samples into a [`ProfileBuilder`]; finalizing
//! averages them into an immutable [`TrainedProfile`]. The two forms are
//! never valid at once: after any accumulator mutation the builder must be
//! finalized again before averaged values are read. The correction loop
//! relies on the builder being a plain value — it clones a builder as the
//! snapshot before a fix attempt and restores the clone on rejection.

use serde::{Deserialize, Serialize};

use crate::charset::{CharacterVariant, MetaClass};
use crate::error::{CoreError, CoreResult};
use crate::features::{FeatureVector, average_features};

/// Accumulating (mutable) form of a character profile
#[derive(Debug, Clone)]
pub struct ProfileBuilder {
    key: CharacterVariant,
    meta: MetaClass,
    has_dot: bool,
    features: Vec<FeatureVector>,
    sizes: Vec<(f64, f64)>,
    center_min: f64,
    center_max: f64,
}

impl ProfileBuilder {
    /// Creates an empty builder for a plain glyph shape
    pub fn new(key: CharacterVariant) -> Self {
        Self::with_meta(key, MetaClass::None, false)
    }

    /// Creates an empty builder with an explicit meta class and dot flag
    pub fn with_meta(key: CharacterVariant, meta: MetaClass, has_dot: bool) -> Self {
        Self {
            key,
            meta,
            has_dot,
            features: Vec::new(),
            sizes: Vec::new(),
            center_min: f64::INFINITY,
            center_max: f64::NEG_INFINITY,
        }
    }

    /// The profile key
    pub fn key(&self) -> CharacterVariant {
        self.key
    }

    /// Number of accumulated samples
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// True when no sample has been accumulated yet
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Adds one raw sample
    ///
    /// `rel_center` is the glyph's vertical center relative to the line
    /// middle, normalized by the line height.
    pub fn accumulate(&mut self, features: FeatureVector, width: f64, height: f64, rel_center: f64) {
        self.features.push(features);
        self.sizes.push((width, height));
        self.center_min = self.center_min.min(rel_center);
        self.center_max = self.center_max.max(rel_center);
    }

    /// Averages the accumulators into an immutable profile
    ///
    /// # Errors
    ///
    /// Returns an error when no sample has been accumulated.
    pub fn finalize(&self) -> CoreResult<TrainedProfile> {
        let features = average_features(&self.features)
            .ok_or_else(|| CoreError::EmptyProfile(self.key.to_string()))?;
        let n = self.sizes.len() as f64;
        let avg_width = self.sizes.iter().map(|&(w, _)| w).sum::<f64>() / n;
        let avg_height = self.sizes.iter().map(|&(_, h)| h).sum::<f64>() / n;
        Ok(TrainedProfile {
            key: self.key,
            avg_width,
            avg_height,
            size_ratio: avg_width / avg_height,
            center_min: self.center_min,
            center_max: self.center_max,
            features,
            has_dot: self.has_dot,
            meta: self.meta,
        })
    }
}

/// Finalized, immutable statistics for one character variant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainedProfile {
    /// The character variant this profile recognizes
    pub key: CharacterVariant,
    /// Average sample width in pixels
    pub avg_width: f64,
    /// Average sample height in pixels
    pub avg_height: f64,
    /// `avg_width / avg_height`
    pub size_ratio: f64,
    /// Lowest observed relative vertical center
    pub center_min: f64,
    /// Highest observed relative vertical center
    pub center_max: f64,
    /// Index-wise averaged feature vector
    pub features: FeatureVector,
    /// True when the shape contains a detached dot
    pub has_dot: bool,
    /// Coarse matching category
    pub meta: MetaClass,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FEATURE_LEN;

    fn fv(fill: f64) -> FeatureVector {
        FeatureVector::from_values([fill; FEATURE_LEN])
    }

    #[test]
    fn test_finalize_empty_is_error() {
        let builder = ProfileBuilder::new(CharacterVariant::base('a'));
        assert!(builder.finalize().is_err());
    }

    #[test]
    fn test_finalize_averages_samples() {
        let mut builder = ProfileBuilder::new(CharacterVariant::base('a'));
        builder.accumulate(fv(0.2), 4.0, 8.0, -0.1);
        builder.accumulate(fv(0.4), 6.0, 12.0, 0.3);

        let profile = builder.finalize().unwrap();
        assert_eq!(profile.avg_width, 5.0);
        assert_eq!(profile.avg_height, 10.0);
        assert_eq!(profile.size_ratio, 0.5);
        assert_eq!(profile.center_min, -0.1);
        assert_eq!(profile.center_max, 0.3);
        for &v in profile.features.values() {
            assert!((v - 0.3).abs() < 1e-12);
        }
    }

    #[test]
    fn test_refinalize_after_mutation_changes_averages() {
        let mut builder = ProfileBuilder::new(CharacterVariant::base('x'));
        builder.accumulate(fv(0.0), 2.0, 2.0, 0.0);
        let first = builder.finalize().unwrap();

        builder.accumulate(fv(1.0), 4.0, 4.0, 0.0);
        let second = builder.finalize().unwrap();

        assert_eq!(first.avg_width, 2.0);
        assert_eq!(second.avg_width, 3.0);
    }

    #[test]
    fn test_clone_snapshot_restores_state() {
        let mut builder = ProfileBuilder::new(CharacterVariant::base('x'));
        builder.accumulate(fv(0.5), 3.0, 3.0, 0.0);

        let snapshot = builder.clone();
        builder.accumulate(fv(0.9), 9.0, 9.0, 0.5);
        builder.accumulate(fv(0.9), 9.0, 9.0, 0.5);
        assert_eq!(builder.len(), 3);

        // Reject the attempt: restore the snapshot
        let restored = snapshot;
        assert_eq!(restored.len(), 1);
        assert_eq!(restored.finalize().unwrap().avg_width, 3.0);
    }

    #[test]
    fn test_meta_and_dot_carried_to_profile() {
        let mut builder = ProfileBuilder::with_meta(
            CharacterVariant::base('i'),
            MetaClass::DotAbove,
            true,
        );
        builder.accumulate(fv(0.1), 2.0, 10.0, 0.0);
        let profile = builder.finalize().unwrap();
        assert_eq!(profile.meta, MetaClass::DotAbove);
        assert!(profile.has_dot);
    }
}
