//! inkscan-testutil - Shared test helpers for the inkscan workspace
//!
//! Provides ASCII-art bitmap construction and a [`Canvas`] for stamping
//! synthetic glyph shapes (stems, dots, bars, discs, diagonal strokes)
//! into a page bitmap. Used by the other crates' unit and integration
//! tests to compose segmentation inputs and synthetic training images.

use inkscan_core::Bitmap;

/// Builds a bitmap from ASCII art: `#` is ink, anything else background
///
/// Rows may have different lengths; the bitmap is as wide as the longest
/// row. Panics on empty input (tests should never pass one).
pub fn bitmap_from_ascii(art: &str) -> Bitmap {
    let rows: Vec<&str> = art.lines().collect();
    let height = rows.len() as u32;
    let width = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0) as u32;
    assert!(width > 0 && height > 0, "ascii art must not be empty");

    let mut bitmap = Bitmap::new(width, height).expect("non-empty dimensions");
    for (y, row) in rows.iter().enumerate() {
        for (x, ch) in row.chars().enumerate() {
            if ch == '#' {
                bitmap
                    .set(x as u32, y as u32, true)
                    .expect("coordinate within parsed dimensions");
            }
        }
    }
    bitmap
}

/// Stamps ASCII-art ink into an existing bitmap at an offset
///
/// Only `#` cells are written; background cells leave the bitmap
/// untouched, so stamps can be composed.
pub fn stamp_ascii(bitmap: &mut Bitmap, art: &str, x: u32, y: u32) {
    for (dy, row) in art.lines().enumerate() {
        for (dx, ch) in row.chars().enumerate() {
            if ch == '#' {
                bitmap
                    .set(x + dx as u32, y + dy as u32, true)
                    .expect("stamp within bitmap bounds");
            }
        }
    }
}

/// A mutable page bitmap with glyph-stamping helpers
#[derive(Debug, Clone)]
pub struct Canvas {
    bitmap: Bitmap,
}

impl Canvas {
    /// Creates an all-background canvas
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            bitmap: Bitmap::new(width, height).expect("non-empty dimensions"),
        }
    }

    /// Consumes the canvas into its bitmap
    pub fn into_bitmap(self) -> Bitmap {
        self.bitmap
    }

    /// Borrows the bitmap
    pub fn bitmap(&self) -> &Bitmap {
        &self.bitmap
    }

    /// Fills a solid rectangle
    pub fn fill_rect(&mut self, x: u32, y: u32, w: u32, h: u32) -> &mut Self {
        for yy in y..y + h {
            for xx in x..x + w {
                let _ = self.bitmap.set(xx, yy, true);
            }
        }
        self
    }

    /// Stamps a narrow vertical stem
    pub fn stem(&mut self, x: u32, y: u32, h: u32) -> &mut Self {
        self.fill_rect(x, y, 2, h)
    }

    /// Stamps a square dot
    pub fn dot(&mut self, x: u32, y: u32, size: u32) -> &mut Self {
        self.fill_rect(x, y, size, size)
    }

    /// Stamps a wide horizontal bar
    pub fn bar(&mut self, x: u32, y: u32, w: u32) -> &mut Self {
        self.fill_rect(x, y, w, 2)
    }

    /// Stamps a filled disc
    pub fn disc(&mut self, cx: u32, cy: u32, r: u32) -> &mut Self {
        let r2 = (r * r) as i64;
        for yy in cy.saturating_sub(r)..=cy + r {
            for xx in cx.saturating_sub(r)..=cx + r {
                let dx = xx as i64 - cx as i64;
                let dy = yy as i64 - cy as i64;
                if dx * dx + dy * dy <= r2 {
                    let _ = self.bitmap.set(xx, yy, true);
                }
            }
        }
        self
    }

    /// Stamps a rising diagonal stroke from bottom-left to top-right
    pub fn diagonal(&mut self, x: u32, y: u32, w: u32, h: u32) -> &mut Self {
        for step in 0..h {
            let xx = x + step * w.saturating_sub(1) / h.max(1);
            let yy = y + h - 1 - step;
            let _ = self.bitmap.set(xx, yy, true);
            let _ = self.bitmap.set(xx + 1, yy, true);
        }
        self
    }
}
