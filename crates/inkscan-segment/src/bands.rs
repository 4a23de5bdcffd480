//! Text line-band detection
//!
//! A band is a maximal run of rows containing ink, demarcated by fully
//! empty rows. Detached dots sit in their own small run just above their
//! base line, so a short band close enough to the band beneath it is
//! merged downward instead of becoming a line of its own.

use inkscan_core::Bitmap;

/// A vertical range of rows grouping the glyphs of one text line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowBand {
    /// First row of the band (inclusive)
    pub top: u32,
    /// One past the last row of the band
    pub bottom: u32,
}

impl RowBand {
    /// Creates a band covering rows `top..bottom`
    pub fn new(top: u32, bottom: u32) -> Self {
        Self { top, bottom }
    }

    /// Band height in rows
    pub fn height(&self) -> u32 {
        self.bottom.saturating_sub(self.top)
    }

    /// Absolute vertical center of the band
    pub fn center(&self) -> f64 {
        (self.top + self.bottom) as f64 / 2.0
    }

    /// True when the vertical position lies inside the band
    pub fn contains(&self, y: f64) -> bool {
        y >= self.top as f64 && y < self.bottom as f64
    }
}

/// Finds the text bands of a page
///
/// `max_height_ratio` bounds how tall a band may be, relative to the band
/// below it, to still count as a detached fragment of that band;
/// `max_gap_ratio` bounds the empty gap beneath it, relative to its own
/// height. Both conditions must hold for the merge.
pub fn detect_bands(bitmap: &Bitmap, max_height_ratio: f64, max_gap_ratio: f64) -> Vec<RowBand> {
    let mut raw = Vec::new();
    let mut start: Option<u32> = None;
    for y in 0..bitmap.height() {
        let empty = bitmap.row_is_empty(y);
        match (start, empty) {
            (None, false) => start = Some(y),
            (Some(top), true) => {
                raw.push(RowBand::new(top, y));
                start = None;
            }
            _ => {}
        }
    }
    if let Some(top) = start {
        raw.push(RowBand::new(top, bitmap.height()));
    }

    // Merge detached fragments (dots, accents) into the band below them
    let mut bands: Vec<RowBand> = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        let mut band = raw[i];
        while i + 1 < raw.len() {
            let below = raw[i + 1];
            let gap = below.top - band.bottom;
            let short_enough = (band.height() as f64)
                <= below.height() as f64 * max_height_ratio;
            let close_enough = (gap as f64) <= band.height() as f64 * max_gap_ratio;
            if short_enough && close_enough {
                band = RowBand::new(band.top, below.bottom);
                i += 1;
            } else {
                break;
            }
        }
        bands.push(band);
        i += 1;
    }
    bands
}

#[cfg(test)]
mod tests {
    use super::*;
    use inkscan_testutil::bitmap_from_ascii;

    #[test]
    fn test_empty_rows_demarcate_bands() {
        let bitmap = bitmap_from_ascii(
            "####\n\
             ####\n\
             ....\n\
             ....\n\
             ....\n\
             ####\n\
             ####",
        );
        let bands = detect_bands(&bitmap, 0.5, 1.0);
        assert_eq!(bands, vec![RowBand::new(0, 2), RowBand::new(5, 7)]);
    }

    #[test]
    fn test_dot_band_merges_into_line_below() {
        // One dot row, one empty row, then a four-row line: the dot band
        // is short relative to the line and the gap is within its height.
        let bitmap = bitmap_from_ascii(
            ".#..\n\
             ....\n\
             .#..\n\
             .#..\n\
             .#..\n\
             .#..",
        );
        let bands = detect_bands(&bitmap, 0.5, 1.0);
        assert_eq!(bands, vec![RowBand::new(0, 6)]);
    }

    #[test]
    fn test_close_full_lines_do_not_merge() {
        // Two equally tall lines with a one-row gap: the height-ratio
        // condition keeps them apart even though the gap is small.
        let bitmap = bitmap_from_ascii(
            "####\n\
             ####\n\
             ####\n\
             ....\n\
             ####\n\
             ####\n\
             ####",
        );
        let bands = detect_bands(&bitmap, 0.5, 1.0);
        assert_eq!(bands.len(), 2);
    }

    #[test]
    fn test_distant_dot_stays_separate() {
        let bitmap = bitmap_from_ascii(
            ".#..\n\
             ....\n\
             ....\n\
             ....\n\
             .#..\n\
             .#..\n\
             .#..\n\
             .#..",
        );
        let bands = detect_bands(&bitmap, 0.5, 1.0);
        assert_eq!(bands.len(), 2);
    }

    #[test]
    fn test_band_helpers() {
        let band = RowBand::new(2, 6);
        assert_eq!(band.height(), 4);
        assert_eq!(band.center(), 4.0);
        assert!(band.contains(2.0));
        assert!(!band.contains(6.0));
    }
}
