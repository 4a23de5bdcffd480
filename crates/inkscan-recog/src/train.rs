//! Training from a synthetic reference image
//!
//! The training image renders a known reference string once per line,
//! each line at one font size. The first pass walks every band through
//! the reference string, labeling the segmented regions and accumulating
//! feature vectors, sizes, vertical centers, merge-distance scalars, and
//! space measurements.
//!
//! The correction loop then re-classifies every labeled sample against
//! the finalized profiles and greedily repairs mismatches: re-accumulate
//! the sample into its expected profile until the classification flips,
//! roll the profile back (value snapshot) when the step cap is hit or the
//! fix makes the character's global error count worse, and permanently
//! exclude combinations that cannot be fixed. The loop is deliberately
//! greedy and non-optimal; it stops at the first zero-change iteration or
//! at the configured cap.

use std::collections::{BTreeMap, HashSet};

use rayon::prelude::*;
use tracing::{debug, info, warn};

use inkscan_core::{
    Bitmap, CharacterVariant, FeatureVector, MOD_STEM, MetaClass, ProfileBuilder, Region,
};
use inkscan_segment::{RowBand, detect_bands, extract_regions_in};
use inkscan_store::ProfileStore;

use crate::classify::Classifier;
use crate::config::EngineOptions;
use crate::error::{RecogError, RecogResult};
use crate::library::{
    MergeRatios, ProfileLibrary, SCALAR_APOSTROPHE_GAP, SCALAR_COLON_GAP, SCALAR_DOT_ABOVE,
    SCALAR_DOT_BELOW, SCALAR_EQUALS_GAP, SCALAR_PERCENT_GAP,
};

/// Accumulate-and-reclassify steps allowed per fix attempt
const MAX_FIX_STEPS: u32 = 10;

/// Statistics from a completed training run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrainReport {
    /// Correction iterations actually run
    pub iterations: u32,
    /// Fixes kept
    pub corrections: u32,
    /// (label, band) combinations excluded as unfixable
    pub excluded: u32,
}

/// A finished training run: the library snapshot plus its statistics
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    /// The finalized, trained library
    pub library: ProfileLibrary,
    /// Run statistics
    pub report: TrainReport,
}

/// Drives segmentation, labeling, and correction over a reference image
#[derive(Debug, Clone, Copy)]
pub struct Trainer<'a> {
    options: &'a EngineOptions,
}

#[derive(Debug, Clone, Copy, Default)]
struct ScalarAcc {
    sum: f64,
    count: u32,
}

impl ScalarAcc {
    fn add(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    fn average(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}

/// One labeled region from the first pass
#[derive(Debug, Clone)]
struct LabeledSample {
    key: CharacterVariant,
    features: FeatureVector,
    width: u32,
    height: u32,
    rel_center: f64,
    band: usize,
}

#[derive(Debug, Default)]
struct TrainState {
    builders: BTreeMap<CharacterVariant, ProfileBuilder>,
    scalars: BTreeMap<&'static str, ScalarAcc>,
    custom: BTreeMap<char, ScalarAcc>,
    samples: Vec<LabeledSample>,
}

impl TrainState {
    fn builder_mut(
        &mut self,
        key: CharacterVariant,
        meta: MetaClass,
        has_dot: bool,
    ) -> &mut ProfileBuilder {
        self.builders
            .entry(key)
            .or_insert_with(|| ProfileBuilder::with_meta(key, meta, has_dot))
    }

    /// Accumulates one region under a label; optionally records it as a
    /// correction-loop sample (pieces and singles are what the scanner
    /// classifies; derived whole-glyph unions are not)
    fn accumulate_region(
        &mut self,
        key: CharacterVariant,
        meta: MetaClass,
        has_dot: bool,
        region: &Region,
        band: &RowBand,
        band_idx: usize,
        record_sample: bool,
    ) {
        let bounds = region.bounds();
        let features = FeatureVector::extract(&region.bitmap());
        let rel_center = (bounds.center_y() - band.center()) / band.height() as f64;
        self.builder_mut(key, meta, has_dot).accumulate(
            features,
            bounds.w as f64,
            bounds.h as f64,
            rel_center,
        );
        if record_sample {
            self.samples.push(LabeledSample {
                key,
                features,
                width: bounds.w,
                height: bounds.h,
                rel_center,
                band: band_idx,
            });
        }
    }

    fn scalar(&mut self, name: &'static str) -> &mut ScalarAcc {
        self.scalars.entry(name).or_default()
    }

    fn scalar_avg(&self, name: &str) -> Option<f64> {
        self.scalars.get(name).and_then(ScalarAcc::average)
    }
}

/// Regions the segmenter produces for one reference character
fn piece_count(c: char) -> usize {
    match c {
        'i' | 'j' | ';' | '!' | '?' | ':' | '=' | '"' => 2,
        '%' => 3,
        _ => 1,
    }
}

impl<'a> Trainer<'a> {
    /// Creates a trainer over the supplied options
    pub fn new(options: &'a EngineOptions) -> Self {
        Self { options }
    }

    /// Runs the full training procedure over a reference image
    ///
    /// # Errors
    ///
    /// Fails when the image has no text bands or a band's region count
    /// does not cover the reference string.
    pub fn train(&self, bitmap: &Bitmap, reference: &str) -> RecogResult<TrainingOutcome> {
        let bands = detect_bands(
            bitmap,
            self.options.max_percent_diff_to_merge,
            self.options.max_percent_distance_to_merge,
        );
        if bands.is_empty() {
            return Err(RecogError::Training(
                "reference image contains no text bands".to_string(),
            ));
        }

        let mut state = TrainState::default();
        for (band_idx, band) in bands.iter().enumerate() {
            self.train_band(&mut state, bitmap, band, band_idx, reference)?;
        }
        info!(
            bands = bands.len(),
            samples = state.samples.len(),
            profiles = state.builders.len(),
            "labeling pass complete"
        );

        let report = self.correct(&mut state)?;
        let library = self.build_library(&state)?;
        Ok(TrainingOutcome { library, report })
    }

    /// Trains against a reference image and persists the result
    pub fn train_into_store(
        &self,
        bitmap: &Bitmap,
        reference: &str,
        store: &mut dyn ProfileStore,
    ) -> RecogResult<TrainingOutcome> {
        let outcome = self.train(bitmap, reference)?;
        outcome.library.save_into(store)?;
        Ok(outcome)
    }

    /// Walks one band through the reference string
    fn train_band(
        &self,
        state: &mut TrainState,
        bitmap: &Bitmap,
        band: &RowBand,
        band_idx: usize,
        reference: &str,
    ) -> RecogResult<()> {
        let mut regions = extract_regions_in(bitmap, band)?;
        regions.sort_by_key(|r| r.bounds().x);

        let mut cursor = 0usize;
        let mut prev_char: Option<char> = None;
        let mut prev_right: Option<u32> = None;

        for c in reference.chars() {
            if c == ' ' {
                if let (Some(right), Some(next)) = (prev_right, regions.get(cursor)) {
                    let gap = next.bounds().x.saturating_sub(right + 1) as f64;
                    state
                        .builder_mut(CharacterVariant::base(' '), MetaClass::None, false)
                        .accumulate(FeatureVector::default(), gap, band.height() as f64, 0.0);
                    if let Some(p) = prev_char
                        && self.options.special_spaces.contains(&p)
                    {
                        state.custom.entry(p).or_default().add(gap / band.height() as f64);
                    }
                }
                prev_char = Some(' ');
                continue;
            }

            let count = piece_count(c);
            if cursor + count > regions.len() {
                return Err(RecogError::Training(format!(
                    "band {band_idx}: ran out of regions at reference character {c:?}"
                )));
            }
            let group = &regions[cursor..cursor + count];
            cursor += count;

            self.train_character(state, c, group, band, band_idx)?;
            prev_right = group.iter().map(|r| r.bounds().right() - 1).max();
            prev_char = Some(c);
        }

        if cursor < regions.len() {
            debug!(
                band = band_idx,
                leftover = regions.len() - cursor,
                "unlabeled regions after reference string"
            );
        }
        Ok(())
    }

    /// Labels one reference character's region group
    fn train_character(
        &self,
        state: &mut TrainState,
        c: char,
        group: &[Region],
        band: &RowBand,
        band_idx: usize,
    ) -> RecogResult<()> {
        if group.len() == 1 {
            state.accumulate_region(
                CharacterVariant::base(c),
                MetaClass::None,
                false,
                &group[0],
                band,
                band_idx,
                true,
            );
            return Ok(());
        }

        match c {
            'i' | 'j' | ';' | '!' | '?' => {
                let (dot, base) = split_dot_and_base(group);
                let below = c == '!' || c == '?';
                let base_key = match c {
                    ';' => CharacterVariant::base(','),
                    _ => CharacterVariant::new(c, MOD_STEM),
                };
                state.accumulate_region(
                    CharacterVariant::base('.'),
                    MetaClass::None,
                    false,
                    dot,
                    band,
                    band_idx,
                    true,
                );
                state.accumulate_region(base_key, MetaClass::None, false, base, band, band_idx, true);

                let gap = if below {
                    dot.bounds().y as f64 - base.bounds().bottom() as f64
                } else {
                    base.bounds().y as f64 - dot.bounds().bottom() as f64
                };
                let reach = base.bounds().h.max(dot.bounds().h) as f64;
                let scalar = if below { SCALAR_DOT_BELOW } else { SCALAR_DOT_ABOVE };
                state.scalar(scalar).add(gap.max(0.0) / reach);

                let meta = if below { MetaClass::DotUnder } else { MetaClass::DotAbove };
                self.accumulate_whole(state, c, meta, true, group, band, band_idx)?;
            }
            ':' | '=' => {
                let piece_key = if c == ':' {
                    CharacterVariant::base('.')
                } else {
                    CharacterVariant::base('-')
                };
                let mut ordered: Vec<&Region> = group.iter().collect();
                ordered.sort_by_key(|r| r.bounds().y);
                for &piece in &ordered {
                    state.accumulate_region(
                        piece_key,
                        MetaClass::None,
                        false,
                        piece,
                        band,
                        band_idx,
                        true,
                    );
                }
                let gap = ordered[1].bounds().y as f64 - ordered[0].bounds().bottom() as f64;
                let reach = ordered[0].bounds().h.max(ordered[1].bounds().h) as f64;
                let scalar = if c == ':' { SCALAR_COLON_GAP } else { SCALAR_EQUALS_GAP };
                state.scalar(scalar).add(gap.max(0.0) / reach);

                self.accumulate_whole(
                    state,
                    c,
                    MetaClass::EvenDots,
                    c == ':',
                    group,
                    band,
                    band_idx,
                )?;
            }
            '"' => {
                let mut ordered: Vec<&Region> = group.iter().collect();
                ordered.sort_by_key(|r| r.bounds().x);
                for &piece in &ordered {
                    state.accumulate_region(
                        CharacterVariant::base('\''),
                        MetaClass::None,
                        false,
                        piece,
                        band,
                        band_idx,
                        true,
                    );
                }
                let gap = ordered[1].bounds().x as f64 - ordered[0].bounds().right() as f64;
                let reach = ordered[0].bounds().h.min(ordered[1].bounds().h) as f64;
                state.scalar(SCALAR_APOSTROPHE_GAP).add(gap.max(0.0) / reach);

                self.accumulate_whole(state, c, MetaClass::Quote, false, group, band, band_idx)?;
            }
            '%' => {
                let mut ordered: Vec<&Region> = group.iter().collect();
                // The stroke is the tallest piece; the circles sort by
                // vertical center into the two trained dot positions.
                ordered.sort_by_key(|r| std::cmp::Reverse(r.bounds().h));
                let stroke = ordered[0];
                let mut circles = vec![ordered[1], ordered[2]];
                circles.sort_by(|a, b| a.bounds().center_y().total_cmp(&b.bounds().center_y()));

                state.accumulate_region(
                    CharacterVariant::base('/'),
                    MetaClass::None,
                    false,
                    stroke,
                    band,
                    band_idx,
                    true,
                );
                for (i, &circle) in circles.iter().enumerate() {
                    state.accumulate_region(
                        CharacterVariant::new('%', i as u8 + 1),
                        MetaClass::None,
                        false,
                        circle,
                        band,
                        band_idx,
                        true,
                    );
                    let distance =
                        (stroke.bounds().center_x() - circle.bounds().center_x()).abs();
                    let reach = stroke.bounds().h.max(circle.bounds().h) as f64;
                    state.scalar(SCALAR_PERCENT_GAP).add(distance / reach);
                }

                self.accumulate_whole(state, c, MetaClass::Percent, false, group, band, band_idx)?;
            }
            _ => {
                return Err(RecogError::Training(format!(
                    "no piece layout for compound character {c:?}"
                )));
            }
        }
        Ok(())
    }

    /// Accumulates the union of a compound character's pieces as its
    /// canonical whole-glyph profile
    fn accumulate_whole(
        &self,
        state: &mut TrainState,
        c: char,
        meta: MetaClass,
        has_dot: bool,
        group: &[Region],
        band: &RowBand,
        band_idx: usize,
    ) -> RecogResult<()> {
        let coords: Vec<(u32, u32)> = group.iter().flat_map(|r| r.coords().iter().copied()).collect();
        let whole = Region::from_coords(coords).map_err(RecogError::Core)?;
        state.accumulate_region(
            CharacterVariant::base(c),
            meta,
            has_dot,
            &whole,
            band,
            band_idx,
            false,
        );
        Ok(())
    }

    /// The iterative correction loop
    fn correct(&self, state: &mut TrainState) -> RecogResult<TrainReport> {
        let mut report = TrainReport::default();
        let mut excluded: HashSet<(CharacterVariant, usize)> = HashSet::new();
        let mut library = self.build_library(state)?;

        for iteration in 0..self.options.max_correction_iterations {
            report.iterations = iteration + 1;
            let mut changes = 0u32;

            for idx in 0..state.samples.len() {
                let sample = state.samples[idx].clone();
                if excluded.contains(&(sample.key, sample.band)) {
                    continue;
                }
                if self.sample_matches(&library, &sample) {
                    continue;
                }

                let Some(snapshot) = state.builders.get(&sample.key).cloned() else {
                    continue;
                };
                let errors_before = self.count_errors(&library, state, sample.key.letter);

                let mut fixed = false;
                for _ in 0..MAX_FIX_STEPS {
                    if let Some(builder) = state.builders.get_mut(&sample.key) {
                        builder.accumulate(
                            sample.features,
                            sample.width as f64,
                            sample.height as f64,
                            sample.rel_center,
                        );
                    }
                    library = self.build_library(state)?;
                    if self.sample_matches(&library, &sample) {
                        fixed = true;
                        break;
                    }
                }

                if !fixed {
                    state.builders.insert(sample.key, snapshot);
                    library = self.build_library(state)?;
                    excluded.insert((sample.key, sample.band));
                    report.excluded += 1;
                    warn!(key = %sample.key, band = sample.band, "correction exhausted; excluded");
                    continue;
                }

                let errors_after = self.count_errors(&library, state, sample.key.letter);
                if errors_after > errors_before {
                    state.builders.insert(sample.key, snapshot);
                    library = self.build_library(state)?;
                    excluded.insert((sample.key, sample.band));
                    report.excluded += 1;
                    warn!(
                        key = %sample.key,
                        band = sample.band,
                        errors_before,
                        errors_after,
                        "fix regressed globally; rolled back and excluded"
                    );
                } else {
                    changes += 1;
                    report.corrections += 1;
                    debug!(key = %sample.key, band = sample.band, "correction kept");
                }
            }

            info!(iteration, changes, "correction iteration complete");
            if changes == 0 {
                break;
            }
        }

        Ok(report)
    }

    /// True when the sample classifies as its own label (the quote /
    /// apostrophe confusion is accepted by policy, not repaired)
    fn sample_matches(&self, library: &ProfileLibrary, sample: &LabeledSample) -> bool {
        let classifier = Classifier::new(library, self.options.size_ratio_weight);
        match classifier.classify(
            &sample.features,
            false,
            MetaClass::None,
            sample.width,
            sample.height,
        ) {
            Some(matched) => {
                matched.profile.key == sample.key
                    || is_accepted_confusion(sample.key.letter, matched.profile.key.letter)
            }
            None => false,
        }
    }

    /// Recounts the character's misclassified samples across all bands
    ///
    /// Read-only over the library snapshot, so the bands' samples are
    /// checked in parallel. The count is always recomputed from scratch;
    /// the accept/reject decision must match the uncached procedure.
    fn count_errors(&self, library: &ProfileLibrary, state: &TrainState, letter: char) -> usize {
        state
            .samples
            .par_iter()
            .filter(|s| s.key.letter == letter)
            .filter(|s| !self.sample_matches(library, s))
            .count()
    }

    /// Finalizes every non-empty builder into a library snapshot
    fn build_library(&self, state: &TrainState) -> RecogResult<ProfileLibrary> {
        let mut profiles = Vec::with_capacity(state.builders.len());
        for builder in state.builders.values() {
            if builder.is_empty() {
                continue;
            }
            profiles.push(builder.finalize().map_err(RecogError::Core)?);
        }

        let defaults = MergeRatios::default();
        let ratios = MergeRatios {
            dot_above: state.scalar_avg(SCALAR_DOT_ABOVE).unwrap_or(defaults.dot_above),
            dot_below: state.scalar_avg(SCALAR_DOT_BELOW).unwrap_or(defaults.dot_below),
            colon_gap: state.scalar_avg(SCALAR_COLON_GAP).unwrap_or(defaults.colon_gap),
            equals_gap: state.scalar_avg(SCALAR_EQUALS_GAP).unwrap_or(defaults.equals_gap),
            apostrophe_gap: state
                .scalar_avg(SCALAR_APOSTROPHE_GAP)
                .unwrap_or(defaults.apostrophe_gap),
            percent_gap: state
                .scalar_avg(SCALAR_PERCENT_GAP)
                .unwrap_or(defaults.percent_gap),
        };

        // Custom space ratios are stored as the excess over the plain
        // space ratio, matching how they widen the used width at scan
        // time.
        let space_ratio = state
            .builders
            .get(&CharacterVariant::base(' '))
            .filter(|b| !b.is_empty())
            .map(|b| b.finalize().map(|p| p.size_ratio))
            .transpose()
            .map_err(RecogError::Core)?
            .unwrap_or(0.0);
        let custom: Vec<(char, f64)> = state
            .custom
            .iter()
            .filter_map(|(&c, acc)| acc.average().map(|avg| (c, avg - space_ratio)))
            .collect();

        Ok(ProfileLibrary::new(profiles, ratios, custom, true))
    }
}

/// Splits a two-piece dotted character into (dot, base) by height
fn split_dot_and_base(group: &[Region]) -> (&Region, &Region) {
    if group[0].bounds().h <= group[1].bounds().h {
        (&group[0], &group[1])
    } else {
        (&group[1], &group[0])
    }
}

/// The quote-vs-apostrophe misclassification accepted during training
fn is_accepted_confusion(expected: char, got: char) -> bool {
    matches!((expected, got), ('"', '\'') | ('\'', '"'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_piece_counts() {
        assert_eq!(piece_count('a'), 1);
        assert_eq!(piece_count('i'), 2);
        assert_eq!(piece_count(';'), 2);
        assert_eq!(piece_count('='), 2);
        assert_eq!(piece_count('%'), 3);
    }

    #[test]
    fn test_accepted_confusion_is_symmetric_and_narrow() {
        assert!(is_accepted_confusion('"', '\''));
        assert!(is_accepted_confusion('\'', '"'));
        assert!(!is_accepted_confusion('i', '\''));
        assert!(!is_accepted_confusion('"', '"'));
    }

    #[test]
    fn test_split_dot_and_base_by_height() {
        let dot = Region::from_coords(vec![(0, 0), (1, 0)]).unwrap();
        let base = Region::from_coords(vec![(0, 3), (0, 4), (0, 5)]).unwrap();
        let group = vec![dot.clone(), base.clone()];
        let (d, b) = split_dot_and_base(&group);
        assert_eq!(d.bounds(), dot.bounds());
        assert_eq!(b.bounds(), base.bounds());

        let group = vec![base.clone(), dot.clone()];
        let (d, b) = split_dot_and_base(&group);
        assert_eq!(d.bounds(), dot.bounds());
        assert_eq!(b.bounds(), base.bounds());
    }

    #[test]
    fn test_scalar_accumulator() {
        let mut acc = ScalarAcc::default();
        assert_eq!(acc.average(), None);
        acc.add(0.2);
        acc.add(0.4);
        assert!((acc.average().unwrap() - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_training_requires_bands() {
        let options = EngineOptions::default();
        let trainer = Trainer::new(&options);
        let blank = Bitmap::new(10, 10).unwrap();
        assert!(matches!(
            trainer.train(&blank, "ab"),
            Err(RecogError::Training(_))
        ));
    }

    #[test]
    fn test_training_detects_missing_regions() {
        let options = EngineOptions::default();
        let trainer = Trainer::new(&options);
        // One blob, but the reference claims two characters
        let mut bitmap = Bitmap::new(10, 10).unwrap();
        for y in 2..8 {
            for x in 2..4 {
                bitmap.set(x, y, true).unwrap();
            }
        }
        assert!(matches!(
            trainer.train(&bitmap, "ab"),
            Err(RecogError::Training(_))
        ));
    }
}
