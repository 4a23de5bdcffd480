//! Compound-glyph merge engine
//!
//! Segmentation splits dotted letters, colons, equals signs, quotes, and
//! percent signs into several regions; the merge engine fuses them back.
//! Rules run in strict priority order over each assembled line. A
//! horizontal rule looks at its neighbors by line index; a vertical rule
//! restricts itself to the glyphs whose x-ranges overlap the target.
//!
//! A rule may only touch glyphs whose merge counter is zero, so no glyph
//! is fused twice by different rules. The percent rule absorbs both of
//! its flanking circles in a single action for the same reason.

pub mod rules;

use inkscan_core::{CharacterVariant, MetaClass};
use tracing::debug;

use crate::library::ProfileLibrary;
use crate::types::{GlyphStats, RecognizedGlyph, TextLine};

pub use rules::{DotAboveRule, DotBelowRule, PercentRule, QuotePairRule, StackRule};

/// Strict, totally ordered rule priority
///
/// The reference priority scale collapsed two named tiers onto one
/// numeric value, leaving their relative order unspecified; this enum
/// replaces it with explicit ordinals. Lower runs first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RulePriority {
    /// Dot reattachment above a base
    Highest = 0,
    /// Dot reattachment below a base
    High = 1,
    /// Vertical stacking (`:`/`=`)
    Normal = 2,
    /// Quote pairing
    Low = 3,
    /// Percent assembly
    Lowest = 4,
}

/// The outcome a rule reports on a successful match
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeAction {
    /// Context indices of the glyphs to absorb into the target
    pub absorbed: Vec<usize>,
    /// The fused glyph's new identity
    pub key: CharacterVariant,
    /// The fused glyph's meta class
    pub meta: MetaClass,
}

/// One compound-glyph fusion rule
pub trait MergeRule: Send + Sync {
    /// Rule name for diagnostics
    fn name(&self) -> &'static str;

    /// Execution tier
    fn priority(&self) -> RulePriority;

    /// True when the rule works on line-order neighbors; false when it
    /// works on vertically related (x-overlapping) glyphs
    fn is_horizontal(&self) -> bool;

    /// Examines the target against its context and reports a fusion, or
    /// declines. Declining is never an error.
    fn try_merge(&self, target: usize, context: &[RecognizedGlyph]) -> Option<MergeAction>;
}

/// An ordered set of merge rules
pub struct RuleSet {
    rules: Vec<Box<dyn MergeRule>>,
}

impl RuleSet {
    /// Orders an externally supplied rule list by priority
    ///
    /// The sort is stable: registration order breaks ties within a tier.
    pub fn new(mut rules: Vec<Box<dyn MergeRule>>) -> Self {
        rules.sort_by_key(|r| r.priority());
        Self { rules }
    }

    /// The standard five-rule set, parameterized by the trained ratios
    pub fn standard(ratios: &crate::library::MergeRatios) -> Self {
        Self::new(vec![
            Box::new(DotAboveRule::new(ratios.dot_above)),
            Box::new(DotBelowRule::new(ratios.dot_below)),
            Box::new(StackRule::new(ratios.colon_gap, ratios.equals_gap)),
            Box::new(QuotePairRule::new(ratios.apostrophe_gap)),
            Box::new(PercentRule::new(ratios.percent_gap)),
        ])
    }

    /// Iterates rules in execution order
    pub fn iter(&self) -> impl Iterator<Item = &dyn MergeRule> {
        self.rules.iter().map(|r| r.as_ref())
    }

    /// Number of registered rules
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// True when no rule is registered
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Runs every rule over one line, fusing matched glyph groups in place
///
/// Rules run sequentially within the line; merge counters and coordinate
/// unions are not safe to mutate from overlapping contexts in parallel.
/// Independent lines can run this concurrently.
pub fn apply_rules(line: &mut TextLine, rules: &RuleSet, library: &ProfileLibrary) {
    for rule in rules.iter() {
        let mut i = 0;
        while i < line.glyphs.len() {
            match rule.try_merge(i, &line.glyphs) {
                Some(action) => {
                    debug!(rule = rule.name(), target = i, key = %action.key, "merge");
                    i = perform_merge(line, i, action, library) + 1;
                }
                None => i += 1,
            }
        }
    }
}

/// Applies one action; returns the target's index after removals
fn perform_merge(
    line: &mut TextLine,
    target: usize,
    action: MergeAction,
    library: &ProfileLibrary,
) -> usize {
    let mut absorbed = action.absorbed;
    absorbed.sort_unstable();
    absorbed.dedup();

    for &j in &absorbed {
        let other = line.glyphs[j].clone();
        let glyph = &mut line.glyphs[target];
        glyph.coords.extend(other.coords);
        glyph.bounds = glyph.bounds.union(&other.bounds);
        glyph.merge_count += other.merge_count + 1;
    }

    let glyph = &mut line.glyphs[target];
    glyph.key = action.key;
    glyph.meta = action.meta;
    if let Some(profile) = library.get(action.key) {
        glyph.stats = GlyphStats::from_profile(profile);
    }

    let shift = absorbed.iter().filter(|&&j| j < target).count();
    for &j in absorbed.iter().rev() {
        line.glyphs.remove(j);
    }
    target - shift
}
