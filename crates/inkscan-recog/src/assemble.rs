//! Line assembly and space synthesis
//!
//! Classified glyphs are grouped into text lines by the band whose
//! y-range contains their vertical center, ordered by x. Spaces are not
//! ink: after merging, they are synthesized from the horizontal gaps
//! between neighbors, scaled by the trained space profile and the line's
//! font size (its band height).

use tracing::debug;

use inkscan_core::{CharacterVariant, Rect};
use inkscan_segment::RowBand;

use crate::library::ProfileLibrary;
use crate::types::{GlyphStats, RecognizedGlyph, TextLine};

/// Leading punctuation that never rounds a near-miss gap up to a space
const NO_ROUND_UP: [char; 6] = ['!', '?', '.', ',', ';', ':'];

/// Fractional remainder past which a near-miss gap counts as one more
/// space (a gap of 0.79 used-widths still reads as one space)
const ROUND_UP_FRACTION: f64 = 0.75;

/// Groups glyphs into per-band lines sorted by x
///
/// A glyph whose center misses every band (possible after aggressive
/// band merging) goes to the band with the nearest center. Bands that
/// end up with no glyphs produce no line.
pub fn assemble_lines(glyphs: Vec<RecognizedGlyph>, bands: &[RowBand]) -> Vec<TextLine> {
    let mut lines: Vec<TextLine> = bands.iter().map(|&band| TextLine::new(band)).collect();
    for glyph in glyphs {
        let center = glyph.bounds.center_y();
        let slot = lines
            .iter()
            .position(|line| line.band.contains(center))
            .or_else(|| {
                lines
                    .iter()
                    .enumerate()
                    .min_by(|(_, a), (_, b)| {
                        let da = (a.band.center() - center).abs();
                        let db = (b.band.center() - center).abs();
                        da.total_cmp(&db)
                    })
                    .map(|(i, _)| i)
            });
        match slot {
            Some(i) => lines[i].glyphs.push(glyph),
            None => debug!(x = glyph.bounds.x, "no band for glyph; dropped"),
        }
    }
    lines.retain(|line| !line.glyphs.is_empty());
    for line in &mut lines {
        line.sort_by_x();
    }
    lines
}

/// Synthesizes space glyphs from inter-glyph gaps
///
/// For each adjacent pair, the gap is divided by the used width
/// `(space_ratio + custom_space(left)) * font_size`. The count is the
/// floor of that quotient; when the glyph the spaces lead into is not
/// no-round-up punctuation and the fractional remainder is past the
/// round-up threshold, one more space is inserted.
pub fn insert_spaces(line: &mut TextLine, library: &ProfileLibrary) {
    let Some(space) = library.space() else {
        debug!("no trained space profile; skipping space synthesis");
        return;
    };
    let space_ratio = space.avg_width / space.avg_height;
    let font_size = line.band.height() as f64;

    let mut inserted = Vec::new();
    for pair in line.glyphs.windows(2) {
        let (left, right) = (&pair[0], &pair[1]);
        let gap = right.bounds.x as f64 - (left.bounds.x + left.bounds.w + 1) as f64;
        if gap <= 0.0 {
            continue;
        }
        let used = (space_ratio + library.custom_space(left.letter())) * font_size;
        if used <= 0.0 {
            continue;
        }

        let quotient = gap / used;
        let mut count = quotient.floor();
        let no_round_up = NO_ROUND_UP.contains(&right.letter());
        if !no_round_up && quotient - count > ROUND_UP_FRACTION {
            count += 1.0;
        }

        for k in 0..count as u32 {
            let x = (left.bounds.right() as f64 + 1.0 + k as f64 * used).round() as u32;
            inserted.push(RecognizedGlyph {
                key: CharacterVariant::base(' '),
                bounds: Rect::new(x, line.band.top, used.max(1.0) as u32, line.band.height()),
                stats: GlyphStats::default(),
                meta: Default::default(),
                merge_count: 0,
                coords: Vec::new(),
            });
        }
    }

    if !inserted.is_empty() {
        line.glyphs.extend(inserted);
        line.sort_by_x();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::MergeRatios;
    use inkscan_core::{FeatureVector, MetaClass, ProfileBuilder, TrainedProfile};

    fn glyph(letter: char, x: u32, y: u32, w: u32, h: u32) -> RecognizedGlyph {
        RecognizedGlyph {
            key: CharacterVariant::base(letter),
            bounds: Rect::new(x, y, w, h),
            stats: GlyphStats::default(),
            meta: MetaClass::None,
            merge_count: 0,
            coords: Vec::new(),
        }
    }

    fn space_profile(avg_width: f64, avg_height: f64) -> TrainedProfile {
        let mut builder = ProfileBuilder::new(CharacterVariant::base(' '));
        builder.accumulate(FeatureVector::default(), avg_width, avg_height, 0.0);
        builder.finalize().unwrap()
    }

    /// Library whose space profile projects a used width of 10 on a
    /// 10-row band (ratio 1.0)
    fn library_with_space() -> ProfileLibrary {
        ProfileLibrary::new(
            vec![space_profile(10.0, 10.0)],
            MergeRatios::default(),
            Vec::new(),
            true,
        )
    }

    fn line_with_gap(gap: u32, right_letter: char) -> TextLine {
        let mut line = TextLine::new(RowBand::new(0, 10));
        // left glyph occupies x 0..4; the formula's gap is
        // right.x - (left.x + left.w + 1)
        line.glyphs.push(glyph('a', 0, 0, 4, 8));
        line.glyphs.push(glyph(right_letter, 5 + gap, 0, 4, 8));
        line
    }

    fn count_spaces(line: &TextLine) -> usize {
        line.glyphs.iter().filter(|g| g.is_space()).count()
    }

    #[test]
    fn test_assemble_by_band_center() {
        let bands = [RowBand::new(0, 10), RowBand::new(20, 30)];
        let glyphs = vec![
            glyph('b', 4, 21, 2, 6),
            glyph('a', 0, 1, 2, 6),
            glyph('c', 0, 24, 2, 4),
        ];
        let lines = assemble_lines(glyphs, &bands);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].text(), "a");
        assert_eq!(lines[1].text(), "bc");
    }

    #[test]
    fn test_homeless_glyph_goes_to_nearest_band() {
        let bands = [RowBand::new(0, 10), RowBand::new(40, 50)];
        // Center y = 16: outside both bands, closer to the first
        let lines = assemble_lines(vec![glyph('x', 0, 14, 2, 4)], &bands);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].band, RowBand::new(0, 10));
    }

    #[test]
    fn test_zero_gap_inserts_nothing() {
        let mut line = line_with_gap(0, 'b');
        insert_spaces(&mut line, &library_with_space());
        assert_eq!(count_spaces(&line), 0);
        assert_eq!(line.text(), "ab");
    }

    #[test]
    fn test_exact_used_width_is_one_space() {
        let mut line = line_with_gap(10, 'b');
        insert_spaces(&mut line, &library_with_space());
        assert_eq!(count_spaces(&line), 1);
        assert_eq!(line.text(), "a b");
    }

    #[test]
    fn test_near_miss_rounds_up_for_normal_letters() {
        // 0.79 of the used width: still one space
        let mut line = line_with_gap(8, 'b');
        insert_spaces(&mut line, &library_with_space());
        assert_eq!(count_spaces(&line), 1);
    }

    #[test]
    fn test_near_miss_does_not_round_up_for_leading_punctuation() {
        let mut line = line_with_gap(8, '!');
        insert_spaces(&mut line, &library_with_space());
        assert_eq!(count_spaces(&line), 0);
    }

    #[test]
    fn test_wide_gap_inserts_multiple_spaces() {
        let mut line = line_with_gap(25, 'b');
        insert_spaces(&mut line, &library_with_space());
        assert_eq!(count_spaces(&line), 2);
        assert_eq!(line.text(), "a  b");
    }

    #[test]
    fn test_custom_space_stretches_used_width() {
        // Custom ratio 1.0 after 'a' doubles the used width, so a gap of
        // one plain used width no longer yields a space.
        let library = ProfileLibrary::new(
            vec![space_profile(10.0, 10.0)],
            MergeRatios::default(),
            vec![('a', 1.0)],
            true,
        );
        let mut line = line_with_gap(10, 'b');
        insert_spaces(&mut line, &library);
        assert_eq!(count_spaces(&line), 0);
    }

    #[test]
    fn test_no_space_profile_is_a_no_op() {
        let library =
            ProfileLibrary::new(Vec::new(), MergeRatios::default(), Vec::new(), true);
        let mut line = line_with_gap(30, 'b');
        insert_spaces(&mut line, &library);
        assert_eq!(count_spaces(&line), 0);
    }
}
