//! Nearest-profile classification
//!
//! A region's feature vector is scored against every candidate profile by
//! the sum of squared per-index differences; lower is better. The raw
//! winner is not always trusted: when the best and second-best scores are
//! too close, or the aspect ratio disagrees too much, the ten best
//! candidates are re-ranked by shape size instead.

use inkscan_core::{FeatureVector, MetaClass, TrainedProfile};
use tracing::debug;

use crate::library::ProfileLibrary;

/// Candidates kept for the tie-break re-rank
const TOP_CANDIDATES: usize = 10;
/// Aspect difference below which the feature-score winner stands
const RATIO_ACCEPT: f64 = 0.01;
/// Feature score below which the winner stands regardless of aspect
const SCORE_ACCEPT: f64 = 0.01;
/// Aspect difference above which the size re-rank triggers
const RATIO_RERANK: f64 = 0.1;
/// Penalty when the shapes disagree on wide-vs-tall by a wide margin
const ORIENTATION_PENALTY: f64 = 300.0;
/// Aspect difference past which the orientation penalty applies
const ORIENTATION_MARGIN: f64 = 0.5;

/// A classification result
#[derive(Debug, Clone, Copy)]
pub struct Match<'a> {
    /// The winning profile
    pub profile: &'a TrainedProfile,
    /// Its feature score (sum of squared differences)
    pub score: f64,
}

/// Scores regions against a profile library
#[derive(Debug, Clone, Copy)]
pub struct Classifier<'a> {
    library: &'a ProfileLibrary,
    size_ratio_weight: f64,
}

impl<'a> Classifier<'a> {
    /// Creates a classifier over one library snapshot
    pub fn new(library: &'a ProfileLibrary, size_ratio_weight: f64) -> Self {
        Self {
            library,
            size_ratio_weight,
        }
    }

    /// Finds the best profile for a region's fingerprint and shape
    ///
    /// Returns `None` when no candidate matches the dot flag and meta
    /// class; the caller must skip the region rather than invent a
    /// character.
    pub fn classify(
        &self,
        features: &FeatureVector,
        has_dot: bool,
        meta: MetaClass,
        width: u32,
        height: u32,
    ) -> Option<Match<'a>> {
        let mut scored: Vec<(f64, &TrainedProfile)> = self
            .library
            .candidates(has_dot, meta)
            .map(|p| (features.distance_sq(&p.features), p))
            .collect();
        if scored.is_empty() {
            debug!(has_dot, ?meta, "no classification candidates");
            return None;
        }

        scored.sort_by(|a, b| a.0.total_cmp(&b.0));
        scored.truncate(TOP_CANDIDATES);

        let (best_score, best) = scored[0];
        let search_ratio = width as f64 / height as f64;
        let ratio_diff = (search_ratio - best.size_ratio).abs();

        // High-confidence short-circuit
        if ratio_diff <= RATIO_ACCEPT || best_score <= SCORE_ACCEPT {
            return Some(Match {
                profile: best,
                score: best_score,
            });
        }

        if let Some(&(second_score, _)) = scored.get(1)
            && (best_score * 2.0 > second_score || ratio_diff > RATIO_RERANK)
        {
            // Feature scores are too close to trust, or the aspect is off:
            // re-rank the shortlist by shape size. The sort is stable, so
            // equal size keys preserve the feature-score order.
            scored.sort_by(|a, b| {
                self.size_key(search_ratio, width, height, a.1)
                    .total_cmp(&self.size_key(search_ratio, width, height, b.1))
            });
            let (score, profile) = scored[0];
            return Some(Match { profile, score });
        }

        Some(Match {
            profile: best,
            score: best_score,
        })
    }

    /// Size-comparator key: weighted aspect difference, plus a large
    /// penalty when the shapes disagree on wide-vs-tall by a wide margin
    fn size_key(
        &self,
        search_ratio: f64,
        width: u32,
        height: u32,
        profile: &TrainedProfile,
    ) -> f64 {
        let diff = (search_ratio - profile.size_ratio).abs();
        let mut key = self.size_ratio_weight * diff;
        let search_wide = width > height;
        let profile_wide = profile.avg_width > profile.avg_height;
        if search_wide != profile_wide && diff > ORIENTATION_MARGIN {
            key += ORIENTATION_PENALTY;
        }
        key
    }
}
