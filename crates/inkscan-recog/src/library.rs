//! In-memory profile library
//!
//! The library is the immutable snapshot the classifier and merge engine
//! read: finalized profiles keyed by character variant, the trained merge
//! distance ratios, and per-letter custom space ratios. The trainer
//! produces a fresh snapshot after every finalize; nothing mutates a
//! library in place.

use std::collections::BTreeMap;

use inkscan_core::{CharacterVariant, MetaClass, TrainedProfile};
use inkscan_store::ProfileStore;

use crate::error::RecogResult;

/// Scalar name: dot-above separation ratio (`i`, `j`, `;`)
pub const SCALAR_DOT_ABOVE: &str = "dot_above";
/// Scalar name: dot-below separation ratio (`!`, `?`)
pub const SCALAR_DOT_BELOW: &str = "dot_below";
/// Scalar name: colon dot-gap ratio
pub const SCALAR_COLON_GAP: &str = "colon_gap";
/// Scalar name: equals bar-gap ratio
pub const SCALAR_EQUALS_GAP: &str = "equals_gap";
/// Scalar name: quote-pair horizontal gap ratio
pub const SCALAR_APOSTROPHE_GAP: &str = "apostrophe_gap";
/// Scalar name: percent stroke-to-circle center distance ratio
pub const SCALAR_PERCENT_GAP: &str = "percent_gap";

/// Trained separation ratios consumed by the merge rules
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MergeRatios {
    /// Gap above a base glyph to its dot, per base height
    pub dot_above: f64,
    /// Gap below a base glyph to its dot, per base height
    pub dot_below: f64,
    /// Gap between the two colon dots, per dot height
    pub colon_gap: f64,
    /// Gap between the two equals bars, per bar height
    pub equals_gap: f64,
    /// Horizontal gap between paired quote halves, per half height
    pub apostrophe_gap: f64,
    /// Horizontal center distance from percent stroke to circle, per
    /// stroke height
    pub percent_gap: f64,
}

impl Default for MergeRatios {
    fn default() -> Self {
        // Fallbacks for reference strings that lack a compound character;
        // training overwrites any ratio it can measure.
        Self {
            dot_above: 0.25,
            dot_below: 0.25,
            colon_gap: 1.0,
            equals_gap: 0.5,
            apostrophe_gap: 1.0,
            percent_gap: 0.75,
        }
    }
}

/// Immutable snapshot of trained recognition state for one font bucket
#[derive(Debug, Clone)]
pub struct ProfileLibrary {
    profiles: BTreeMap<CharacterVariant, TrainedProfile>,
    ratios: MergeRatios,
    custom_spaces: BTreeMap<char, f64>,
    trained: bool,
}

impl ProfileLibrary {
    /// Builds a library from its parts
    pub fn new(
        profiles: impl IntoIterator<Item = TrainedProfile>,
        ratios: MergeRatios,
        custom_spaces: impl IntoIterator<Item = (char, f64)>,
        trained: bool,
    ) -> Self {
        Self {
            profiles: profiles.into_iter().map(|p| (p.key, p)).collect(),
            ratios,
            custom_spaces: custom_spaces.into_iter().collect(),
            trained,
        }
    }

    /// Loads the library for the store's font bucket
    pub fn from_store(store: &dyn ProfileStore) -> RecogResult<Self> {
        let defaults = MergeRatios::default();
        let ratios = MergeRatios {
            dot_above: store.load_scalar(SCALAR_DOT_ABOVE)?.unwrap_or(defaults.dot_above),
            dot_below: store.load_scalar(SCALAR_DOT_BELOW)?.unwrap_or(defaults.dot_below),
            colon_gap: store.load_scalar(SCALAR_COLON_GAP)?.unwrap_or(defaults.colon_gap),
            equals_gap: store.load_scalar(SCALAR_EQUALS_GAP)?.unwrap_or(defaults.equals_gap),
            apostrophe_gap: store
                .load_scalar(SCALAR_APOSTROPHE_GAP)?
                .unwrap_or(defaults.apostrophe_gap),
            percent_gap: store
                .load_scalar(SCALAR_PERCENT_GAP)?
                .unwrap_or(defaults.percent_gap),
        };
        Ok(Self::new(
            store.load_profiles()?,
            ratios,
            store.custom_spaces()?,
            store.is_trained()?,
        ))
    }

    /// Persists the whole library into a store and marks it trained
    pub fn save_into(&self, store: &mut dyn ProfileStore) -> RecogResult<()> {
        for profile in self.profiles.values() {
            store.save_profile(profile)?;
        }
        store.save_scalar(SCALAR_DOT_ABOVE, self.ratios.dot_above)?;
        store.save_scalar(SCALAR_DOT_BELOW, self.ratios.dot_below)?;
        store.save_scalar(SCALAR_COLON_GAP, self.ratios.colon_gap)?;
        store.save_scalar(SCALAR_EQUALS_GAP, self.ratios.equals_gap)?;
        store.save_scalar(SCALAR_APOSTROPHE_GAP, self.ratios.apostrophe_gap)?;
        store.save_scalar(SCALAR_PERCENT_GAP, self.ratios.percent_gap)?;
        for (&letter, &ratio) in &self.custom_spaces {
            store.save_custom_space(letter, ratio)?;
        }
        store.set_trained(true)?;
        Ok(())
    }

    /// True once a training run has completed for this bucket
    pub fn is_trained(&self) -> bool {
        self.trained
    }

    /// Looks up one profile by key
    pub fn get(&self, key: CharacterVariant) -> Option<&TrainedProfile> {
        self.profiles.get(&key)
    }

    /// Number of stored profiles
    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    /// True when no profile is stored
    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// Classifier candidates: profiles matching the dot flag and meta
    /// class, in deterministic key order
    ///
    /// The space pseudo-profile never competes; it only carries the size
    /// statistics used for space synthesis.
    pub fn candidates(
        &self,
        has_dot: bool,
        meta: MetaClass,
    ) -> impl Iterator<Item = &TrainedProfile> {
        self.profiles.values().filter(move |p| {
            p.key.letter != ' ' && p.has_dot == has_dot && p.meta == meta
        })
    }

    /// The space pseudo-profile measured during training, if any
    pub fn space(&self) -> Option<&TrainedProfile> {
        self.profiles.get(&CharacterVariant::base(' '))
    }

    /// The trained merge distance ratios
    pub fn ratios(&self) -> &MergeRatios {
        &self.ratios
    }

    /// The custom trailing-space ratio for a letter (0 when unmeasured)
    pub fn custom_space(&self, letter: char) -> f64 {
        self.custom_spaces.get(&letter).copied().unwrap_or(0.0)
    }

    /// All measured custom-space ratios
    pub fn custom_spaces(&self) -> impl Iterator<Item = (char, f64)> + '_ {
        self.custom_spaces.iter().map(|(&c, &r)| (c, r))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inkscan_core::{FeatureVector, ProfileBuilder};
    use inkscan_store::MemoryStore;

    fn profile(letter: char, meta: MetaClass, has_dot: bool) -> TrainedProfile {
        let mut builder =
            ProfileBuilder::with_meta(CharacterVariant::base(letter), meta, has_dot);
        builder.accumulate(FeatureVector::default(), 4.0, 8.0, 0.0);
        builder.finalize().unwrap()
    }

    #[test]
    fn test_candidates_filter_by_dot_and_meta() {
        let library = ProfileLibrary::new(
            vec![
                profile('a', MetaClass::None, false),
                profile('i', MetaClass::DotAbove, true),
                profile(':', MetaClass::EvenDots, true),
            ],
            MergeRatios::default(),
            Vec::new(),
            true,
        );

        let plain: Vec<char> = library
            .candidates(false, MetaClass::None)
            .map(|p| p.key.letter)
            .collect();
        assert_eq!(plain, vec!['a']);

        let dotted: Vec<char> = library
            .candidates(true, MetaClass::DotAbove)
            .map(|p| p.key.letter)
            .collect();
        assert_eq!(dotted, vec!['i']);
    }

    #[test]
    fn test_space_profile_excluded_from_candidates() {
        let library = ProfileLibrary::new(
            vec![profile(' ', MetaClass::None, false), profile('x', MetaClass::None, false)],
            MergeRatios::default(),
            Vec::new(),
            true,
        );
        let letters: Vec<char> = library
            .candidates(false, MetaClass::None)
            .map(|p| p.key.letter)
            .collect();
        assert_eq!(letters, vec!['x']);
        assert!(library.space().is_some());
    }

    #[test]
    fn test_store_roundtrip() {
        let library = ProfileLibrary::new(
            vec![profile('a', MetaClass::None, false)],
            MergeRatios {
                dot_above: 0.3,
                ..MergeRatios::default()
            },
            vec![('!', 0.2)],
            true,
        );

        let mut store = MemoryStore::new();
        library.save_into(&mut store).unwrap();
        assert!(store.is_trained().unwrap());

        let loaded = ProfileLibrary::from_store(&store).unwrap();
        assert!(loaded.is_trained());
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.ratios().dot_above, 0.3);
        assert_eq!(loaded.custom_space('!'), 0.2);
        assert_eq!(loaded.custom_space('a'), 0.0);
    }

    #[test]
    fn test_missing_scalars_fall_back_to_defaults() {
        let store = MemoryStore::new();
        let library = ProfileLibrary::from_store(&store).unwrap();
        assert!(!library.is_trained());
        assert_eq!(library.ratios().colon_gap, MergeRatios::default().colon_gap);
    }
}
