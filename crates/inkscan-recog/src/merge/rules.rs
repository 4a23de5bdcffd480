//! The fixed compound-glyph rule set
//!
//! Each rule projects an expected separation from a ratio learned during
//! training — `ratio * max(target height, candidate height)` for the
//! vertical rules and the percent flanks, `ratio * min(...)` for the
//! quote pair — and accepts the observed gap within the rule's tolerance
//! window. A candidate that was already fused (merge counter above zero)
//! never qualifies.

use inkscan_core::{CharacterVariant, MOD_STEM, MetaClass};

use super::{MergeAction, MergeRule, RulePriority};
use crate::types::RecognizedGlyph;

/// Tolerance for dot reattachment and stacking: ±50% of the projection
const WIDE_TOLERANCE: f64 = 0.5;
/// Tolerance for quote pairing: ±25% of the projection
const NARROW_TOLERANCE: f64 = 0.25;

fn within(gap: f64, expected: f64, tolerance: f64) -> bool {
    expected > 0.0 && (gap - expected).abs() <= tolerance * expected
}

fn is_plain_dot(glyph: &RecognizedGlyph) -> bool {
    glyph.key == CharacterVariant::base('.') && glyph.merge_count == 0
}

/// Picks the x-overlapping dot with the gap closest to the projection
fn closest_dot_vertically(
    target: usize,
    context: &[RecognizedGlyph],
    ratio: f64,
    below: bool,
) -> Option<usize> {
    let base = &context[target];
    let mut best: Option<(usize, f64)> = None;
    for (j, cand) in context.iter().enumerate() {
        if j == target || !is_plain_dot(cand) || !base.bounds.h_overlaps(&cand.bounds) {
            continue;
        }
        let gap = if below {
            cand.bounds.y as f64 - base.bounds.bottom() as f64
        } else {
            base.bounds.y as f64 - cand.bounds.bottom() as f64
        };
        if gap < 0.0 {
            continue;
        }
        let expected = ratio * base.bounds.h.max(cand.bounds.h) as f64;
        if !within(gap, expected, WIDE_TOLERANCE) {
            continue;
        }
        let error = (gap - expected).abs();
        if best.is_none_or(|(_, e)| error < e) {
            best = Some((j, error));
        }
    }
    best.map(|(j, _)| j)
}

/// Reattaches a dot above an `i`/`j` stem, an apostrophe-classified
/// stroke, or a comma base, producing `i`, `j`, or `;`
#[derive(Debug, Clone, Copy)]
pub struct DotAboveRule {
    ratio: f64,
}

impl DotAboveRule {
    /// Creates the rule with the trained dot-above ratio
    pub fn new(ratio: f64) -> Self {
        Self { ratio }
    }

    fn outcome(key: CharacterVariant) -> Option<char> {
        match (key.letter, key.modifier) {
            ('i', MOD_STEM) => Some('i'),
            ('j', MOD_STEM) => Some('j'),
            ('\'', 0) => Some('i'),
            (',', 0) => Some(';'),
            _ => None,
        }
    }
}

impl MergeRule for DotAboveRule {
    fn name(&self) -> &'static str {
        "dot-above"
    }

    fn priority(&self) -> RulePriority {
        RulePriority::Highest
    }

    fn is_horizontal(&self) -> bool {
        false
    }

    fn try_merge(&self, target: usize, context: &[RecognizedGlyph]) -> Option<MergeAction> {
        let base = &context[target];
        if base.merge_count > 0 {
            return None;
        }
        let letter = Self::outcome(base.key)?;
        let dot = closest_dot_vertically(target, context, self.ratio, false)?;
        Some(MergeAction {
            absorbed: vec![dot],
            key: CharacterVariant::base(letter),
            meta: MetaClass::DotAbove,
        })
    }
}

/// Reattaches a dot below an exclamation or question base
#[derive(Debug, Clone, Copy)]
pub struct DotBelowRule {
    ratio: f64,
}

impl DotBelowRule {
    /// Creates the rule with the trained dot-below ratio
    pub fn new(ratio: f64) -> Self {
        Self { ratio }
    }

    fn outcome(key: CharacterVariant) -> Option<char> {
        match (key.letter, key.modifier) {
            ('!', MOD_STEM) => Some('!'),
            ('?', MOD_STEM) => Some('?'),
            _ => None,
        }
    }
}

impl MergeRule for DotBelowRule {
    fn name(&self) -> &'static str {
        "dot-below"
    }

    fn priority(&self) -> RulePriority {
        RulePriority::High
    }

    fn is_horizontal(&self) -> bool {
        false
    }

    fn try_merge(&self, target: usize, context: &[RecognizedGlyph]) -> Option<MergeAction> {
        let base = &context[target];
        if base.merge_count > 0 {
            return None;
        }
        let letter = Self::outcome(base.key)?;
        let dot = closest_dot_vertically(target, context, self.ratio, true)?;
        Some(MergeAction {
            absorbed: vec![dot],
            key: CharacterVariant::base(letter),
            meta: MetaClass::DotUnder,
        })
    }
}

/// Stacks two dots into `:` or two bars into `=`
#[derive(Debug, Clone, Copy)]
pub struct StackRule {
    colon_ratio: f64,
    equals_ratio: f64,
}

impl StackRule {
    /// Creates the rule with the trained colon and equals gap ratios
    pub fn new(colon_ratio: f64, equals_ratio: f64) -> Self {
        Self {
            colon_ratio,
            equals_ratio,
        }
    }
}

impl MergeRule for StackRule {
    fn name(&self) -> &'static str {
        "stack"
    }

    fn priority(&self) -> RulePriority {
        RulePriority::Normal
    }

    fn is_horizontal(&self) -> bool {
        false
    }

    fn try_merge(&self, target: usize, context: &[RecognizedGlyph]) -> Option<MergeAction> {
        let upper = &context[target];
        if upper.merge_count > 0 {
            return None;
        }
        let (letter, ratio) = match (upper.key.letter, upper.key.modifier) {
            ('.', 0) => (':', self.colon_ratio),
            ('-', 0) => ('=', self.equals_ratio),
            _ => return None,
        };

        let mut best: Option<(usize, f64)> = None;
        for (j, cand) in context.iter().enumerate() {
            if j == target
                || cand.key != upper.key
                || cand.merge_count > 0
                || !upper.bounds.h_overlaps(&cand.bounds)
            {
                continue;
            }
            let gap = cand.bounds.y as f64 - upper.bounds.bottom() as f64;
            if gap < 0.0 {
                continue;
            }
            let expected = ratio * upper.bounds.h.max(cand.bounds.h) as f64;
            if !within(gap, expected, WIDE_TOLERANCE) {
                continue;
            }
            let error = (gap - expected).abs();
            if best.is_none_or(|(_, e)| error < e) {
                best = Some((j, error));
            }
        }
        let (lower, _) = best?;
        Some(MergeAction {
            absorbed: vec![lower],
            key: CharacterVariant::base(letter),
            meta: MetaClass::EvenDots,
        })
    }
}

/// Pairs two adjacent narrow apostrophe-class strokes into one `"`
#[derive(Debug, Clone, Copy)]
pub struct QuotePairRule {
    ratio: f64,
}

impl QuotePairRule {
    /// Creates the rule with the trained apostrophe gap ratio
    pub fn new(ratio: f64) -> Self {
        Self { ratio }
    }
}

impl MergeRule for QuotePairRule {
    fn name(&self) -> &'static str {
        "quote-pair"
    }

    fn priority(&self) -> RulePriority {
        RulePriority::Low
    }

    fn is_horizontal(&self) -> bool {
        true
    }

    fn try_merge(&self, target: usize, context: &[RecognizedGlyph]) -> Option<MergeAction> {
        let left = &context[target];
        let right = context.get(target + 1)?;
        if left.merge_count > 0 || right.merge_count > 0 {
            return None;
        }
        if left.key != CharacterVariant::base('\'') || right.key != CharacterVariant::base('\'') {
            return None;
        }
        if !left.bounds.v_overlaps(&right.bounds) {
            return None;
        }
        let gap = right.bounds.x as f64 - left.bounds.right() as f64;
        if gap < 0.0 {
            return None;
        }
        let expected = self.ratio * left.bounds.h.min(right.bounds.h) as f64;
        if !within(gap, expected, NARROW_TOLERANCE) {
            return None;
        }
        Some(MergeAction {
            absorbed: vec![target + 1],
            key: CharacterVariant::base('"'),
            meta: MetaClass::Quote,
        })
    }
}

/// Fuses a diagonal stroke with its two flanking circles into `%`
///
/// Both flanks are absorbed in one action: a second pass could never fire
/// once the first fusion bumps the merge counter.
#[derive(Debug, Clone, Copy)]
pub struct PercentRule {
    ratio: f64,
}

impl PercentRule {
    /// Creates the rule with the trained percent center-distance ratio
    pub fn new(ratio: f64) -> Self {
        Self { ratio }
    }

    fn is_circle(glyph: &RecognizedGlyph) -> bool {
        glyph.key.letter == '%'
            && (glyph.key.modifier == 1 || glyph.key.modifier == 2)
            && glyph.merge_count == 0
    }

    fn flank_ok(&self, stroke: &RecognizedGlyph, flank: &RecognizedGlyph) -> bool {
        let distance = (stroke.bounds.center_x() - flank.bounds.center_x()).abs();
        let expected = self.ratio * stroke.bounds.h.max(flank.bounds.h) as f64;
        within(distance, expected, WIDE_TOLERANCE)
    }
}

impl MergeRule for PercentRule {
    fn name(&self) -> &'static str {
        "percent"
    }

    fn priority(&self) -> RulePriority {
        RulePriority::Lowest
    }

    fn is_horizontal(&self) -> bool {
        true
    }

    fn try_merge(&self, target: usize, context: &[RecognizedGlyph]) -> Option<MergeAction> {
        if target == 0 {
            return None;
        }
        let stroke = &context[target];
        if stroke.key.letter != '/' || stroke.merge_count > 0 {
            return None;
        }
        let prev = &context[target - 1];
        let next = context.get(target + 1)?;
        if !Self::is_circle(prev) || !Self::is_circle(next) {
            return None;
        }
        if !self.flank_ok(stroke, prev) || !self.flank_ok(stroke, next) {
            return None;
        }
        Some(MergeAction {
            absorbed: vec![target - 1, target + 1],
            key: CharacterVariant::base('%'),
            meta: MetaClass::Percent,
        })
    }
}
