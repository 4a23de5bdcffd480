//! Connected ink regions
//!
//! A [`Region`] is a maximal 8-connected set of ink pixels discovered by
//! flood fill. It owns its coordinates exclusively; merging transfers the
//! absorbed region's coordinates into the survivor and consumes it, so a
//! pixel can never belong to two live regions.

use crate::bitmap::Bitmap;
use crate::charset::CharacterVariant;
use crate::error::{CoreError, CoreResult};
use crate::geom::Rect;

/// A connected component under construction or classification
#[derive(Debug, Clone)]
pub struct Region {
    coords: Vec<(u32, u32)>,
    bounds: Rect,
    merge_count: u32,
    label: Option<CharacterVariant>,
}

impl Region {
    /// Creates a region from its pixel coordinates
    ///
    /// The coordinate list must be duplicate-free (the segmenter
    /// guarantees this by consuming pixels as it visits them).
    ///
    /// # Errors
    ///
    /// Returns an error for an empty coordinate list.
    pub fn from_coords(coords: Vec<(u32, u32)>) -> CoreResult<Self> {
        let bounds = bounds_of(&coords).ok_or(CoreError::EmptyRegion)?;
        Ok(Self {
            coords,
            bounds,
            merge_count: 0,
            label: None,
        })
    }

    /// The pixel coordinates of this region
    pub fn coords(&self) -> &[(u32, u32)] {
        &self.coords
    }

    /// The bounding box (always the smallest box containing the coordinates)
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Number of pixels in this region
    pub fn pixel_count(&self) -> usize {
        self.coords.len()
    }

    /// How many times this region has been fused with another
    pub fn merge_count(&self) -> u32 {
        self.merge_count
    }

    /// The training-time expected label, if assigned
    pub fn label(&self) -> Option<CharacterVariant> {
        self.label
    }

    /// Assigns the training-time expected label
    pub fn set_label(&mut self, label: CharacterVariant) {
        self.label = Some(label);
    }

    /// Reconstructs the locally cropped bitmap from the coordinate set
    pub fn bitmap(&self) -> Bitmap {
        let mut bitmap = Bitmap::new(self.bounds.w, self.bounds.h)
            .unwrap_or_else(|_| unreachable!("bounds extent is at least 1x1"));
        for &(x, y) in &self.coords {
            let _ = bitmap.set(x - self.bounds.x, y - self.bounds.y, true);
        }
        bitmap
    }

    /// Fuses another region into this one
    ///
    /// Transfers all of `other`'s coordinates, grows the bounding box to
    /// the exact union, and bumps the merge counter. The absorbed region
    /// is consumed.
    pub fn absorb(&mut self, other: Region) {
        self.coords.extend(other.coords);
        self.bounds = self.bounds.union(&other.bounds);
        self.merge_count += other.merge_count + 1;
    }
}

fn bounds_of(coords: &[(u32, u32)]) -> Option<Rect> {
    let (&(x0, y0), rest) = coords.split_first()?;
    let mut min_x = x0;
    let mut min_y = y0;
    let mut max_x = x0;
    let mut max_y = y0;
    for &(x, y) in rest {
        min_x = min_x.min(x);
        min_y = min_y.min(y);
        max_x = max_x.max(x);
        max_y = max_y.max(y);
    }
    Some(Rect::new(min_x, min_y, max_x - min_x + 1, max_y - min_y + 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_coords_rejects_empty() {
        assert!(Region::from_coords(Vec::new()).is_err());
    }

    #[test]
    fn test_bounds_are_minimal() {
        let region = Region::from_coords(vec![(3, 4), (5, 4), (4, 7)]).unwrap();
        assert_eq!(region.bounds(), Rect::new(3, 4, 3, 4));
        assert_eq!(region.pixel_count(), 3);
    }

    #[test]
    fn test_single_pixel_region() {
        let region = Region::from_coords(vec![(9, 2)]).unwrap();
        assert_eq!(region.bounds(), Rect::new(9, 2, 1, 1));
        assert!(region.bitmap().is_ink(0, 0));
    }

    #[test]
    fn test_bitmap_is_cropped() {
        let region = Region::from_coords(vec![(10, 10), (11, 11)]).unwrap();
        let bitmap = region.bitmap();
        assert_eq!(bitmap.width(), 2);
        assert_eq!(bitmap.height(), 2);
        assert!(bitmap.is_ink(0, 0));
        assert!(bitmap.is_ink(1, 1));
        assert!(!bitmap.is_ink(1, 0));
    }

    #[test]
    fn test_absorb_unions_coordinates_and_bounds() {
        let mut a = Region::from_coords(vec![(0, 5), (1, 5)]).unwrap();
        let b = Region::from_coords(vec![(0, 0), (1, 1)]).unwrap();
        a.absorb(b);

        assert_eq!(a.pixel_count(), 4);
        assert_eq!(a.merge_count(), 1);
        assert_eq!(a.bounds(), Rect::new(0, 0, 2, 6));

        let mut coords = a.coords().to_vec();
        coords.sort_unstable();
        assert_eq!(coords, vec![(0, 0), (0, 5), (1, 1), (1, 5)]);
    }

    #[test]
    fn test_absorb_accumulates_merge_counts() {
        let mut a = Region::from_coords(vec![(0, 0)]).unwrap();
        let mut b = Region::from_coords(vec![(2, 0)]).unwrap();
        b.absorb(Region::from_coords(vec![(3, 0)]).unwrap());
        a.absorb(b);
        assert_eq!(a.merge_count(), 2);
    }
}
