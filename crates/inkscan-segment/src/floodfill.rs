//! Connected-component extraction by consuming flood fill
//!
//! The scan runs top-to-bottom then left-to-right over a working copy of
//! the input. At each remaining ink pixel an 8-way flood fill collects
//! one maximal connected blob into a [`Region`], clearing every visited
//! pixel so no pixel is ever revisited. The fill uses an explicit work
//! list: large solid glyphs and scanned noise can span thousands of
//! contiguous pixels, far past any safe recursion depth.

use std::collections::VecDeque;

use inkscan_core::{Bitmap, Region};

use crate::bands::RowBand;
use crate::error::{SegmentError, SegmentResult};

/// Finds every maximal 8-connected ink blob in the bitmap
///
/// The union of the returned regions' coordinates is exactly the set of
/// ink pixels, and no coordinate appears in two regions. Regions touching
/// the image border and single-pixel regions are valid output; callers
/// may filter the latter as noise.
pub fn extract_regions(bitmap: &Bitmap) -> SegmentResult<Vec<Region>> {
    let mut work = bitmap.clone();
    collect_regions(&mut work, 0, bitmap.height())
}

/// Training variant: scans only the rows of one text band
///
/// The fill itself is unrestricted, but bands are separated by fully
/// empty rows, so a blob never crosses a band boundary.
pub fn extract_regions_in(bitmap: &Bitmap, band: &RowBand) -> SegmentResult<Vec<Region>> {
    if band.bottom > bitmap.height() {
        return Err(SegmentError::BandOutOfRange {
            top: band.top,
            bottom: band.bottom,
            height: bitmap.height(),
        });
    }
    let mut work = bitmap.clone();
    collect_regions(&mut work, band.top, band.bottom)
}

fn collect_regions(work: &mut Bitmap, top: u32, bottom: u32) -> SegmentResult<Vec<Region>> {
    let mut regions = Vec::new();
    for y in top..bottom {
        for x in 0..work.width() {
            if work.is_ink(x, y) {
                let coords = consume_blob(work, x, y);
                regions.push(Region::from_coords(coords)?);
            }
        }
    }
    Ok(regions)
}

/// Flood-fills one blob from the seed, clearing pixels as it visits them
fn consume_blob(work: &mut Bitmap, seed_x: u32, seed_y: u32) -> Vec<(u32, u32)> {
    let width = work.width();
    let height = work.height();
    let mut coords = Vec::new();
    let mut queue = VecDeque::new();
    queue.push_back((seed_x, seed_y));

    while let Some((x, y)) = queue.pop_front() {
        if !work.is_ink(x, y) {
            continue;
        }
        // Consume the pixel so no later scan or queue entry revisits it
        let _ = work.set(x, y, false);
        coords.push((x, y));

        let x0 = x.saturating_sub(1);
        let y0 = y.saturating_sub(1);
        let x1 = (x + 1).min(width.saturating_sub(1));
        let y1 = (y + 1).min(height.saturating_sub(1));
        for ny in y0..=y1 {
            for nx in x0..=x1 {
                if (nx, ny) != (x, y) && work.is_ink(nx, ny) {
                    queue.push_back((nx, ny));
                }
            }
        }
    }

    coords
}
