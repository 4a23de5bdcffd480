//! The end-to-end recognition pipeline
//!
//! bitmap -> regions -> feature vectors -> classified glyphs -> lines ->
//! merged compound glyphs -> spaces -> text.
//!
//! Segmentation is sequential (the fill consumes pixels); feature
//! extraction and classification are pure per-region work fanned out with
//! rayon, as is the per-line merge stage. A region with no classifier
//! candidate is skipped, never invented; the only hard failure is an
//! untrained library.

use rayon::prelude::*;
use tracing::debug;

use inkscan_core::{Bitmap, FeatureVector, MetaClass};
use inkscan_segment::{detect_bands, extract_regions};
use inkscan_store::ProfileStore;

use crate::assemble::{assemble_lines, insert_spaces};
use crate::classify::Classifier;
use crate::config::EngineOptions;
use crate::error::{RecogError, RecogResult};
use crate::library::ProfileLibrary;
use crate::merge::{RuleSet, apply_rules};
use crate::types::{GlyphStats, Page, RecognizedGlyph};

/// Recognizes a page against a trained library snapshot
///
/// # Errors
///
/// Returns [`RecogError::Untrained`] when the library has no completed
/// training run; scanning must never proceed on untrained profiles.
pub fn scan_bitmap(
    bitmap: &Bitmap,
    library: &ProfileLibrary,
    options: &EngineOptions,
    rules: &RuleSet,
) -> RecogResult<Page> {
    if !library.is_trained() {
        return Err(RecogError::Untrained);
    }

    let bands = detect_bands(
        bitmap,
        options.max_percent_diff_to_merge,
        options.max_percent_distance_to_merge,
    );
    let regions = extract_regions(bitmap)?;
    let classifier = Classifier::new(library, options.size_ratio_weight);

    let glyphs: Vec<RecognizedGlyph> = regions
        .into_par_iter()
        .filter_map(|region| {
            let features = FeatureVector::extract(&region.bitmap());
            let bounds = region.bounds();
            match classifier.classify(&features, false, MetaClass::None, bounds.w, bounds.h) {
                Some(matched) => Some(RecognizedGlyph {
                    key: matched.profile.key,
                    bounds,
                    stats: GlyphStats::from_profile(matched.profile),
                    meta: matched.profile.meta,
                    merge_count: region.merge_count(),
                    coords: region.coords().to_vec(),
                }),
                None => {
                    debug!(x = bounds.x, y = bounds.y, "unclassifiable region skipped");
                    None
                }
            }
        })
        .collect();

    let mut lines = assemble_lines(glyphs, &bands);
    lines.par_iter_mut().for_each(|line| {
        apply_rules(line, rules, library);
        insert_spaces(line, library);
    });

    Ok(Page { lines })
}

/// Loads the store's bucket and recognizes a page with the standard rules
pub fn scan_with_store(
    bitmap: &Bitmap,
    store: &dyn ProfileStore,
    options: &EngineOptions,
) -> RecogResult<Page> {
    let library = ProfileLibrary::from_store(store)?;
    let rules = RuleSet::standard(library.ratios());
    scan_bitmap(bitmap, &library, options, &rules)
}
