//! Engine configuration
//!
//! Options are supplied once when a pipeline is constructed and never
//! mutated mid-run. The structure deserializes from declarative config
//! files owned by the caller.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Tunable options for scanning and training
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineOptions {
    /// Characters after which custom trailing spacing is measured during
    /// training (wide or narrow punctuation)
    pub special_spaces: BTreeSet<char>,

    /// Upper bound on correction-loop iterations
    pub max_correction_iterations: u32,

    /// Line-band merging: a band may be at most this fraction of the
    /// height of the band below it to merge into it
    pub max_percent_diff_to_merge: f64,

    /// Line-band merging: the empty gap beneath a band may be at most
    /// this fraction of the band's own height
    pub max_percent_distance_to_merge: f64,

    /// Weight applied to aspect-ratio differences in the classifier's
    /// size comparator
    pub size_ratio_weight: f64,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            special_spaces: BTreeSet::new(),
            max_correction_iterations: 10,
            max_percent_diff_to_merge: 0.5,
            max_percent_distance_to_merge: 1.0,
            size_ratio_weight: 1.0,
        }
    }
}
