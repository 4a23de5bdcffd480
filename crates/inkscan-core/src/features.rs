//! Geometric feature extraction
//!
//! A region's shape is reduced to a 17-value fingerprint of filled/total
//! ratios, each in `[0, 1]`:
//!
//! - values 0..8 come from splitting the bitmap into 2x2 quadrants and
//!   bisecting each quadrant diagonally, alternating the slope direction
//!   per quadrant (TL and BR use the falling diagonal, TR and BL the
//!   rising one);
//! - values 8..17 come from a 3x3 grid of horizontal thirds by vertical
//!   thirds.
//!
//! A section with zero pixels (possible for 1-pixel-wide or -tall shapes)
//! contributes exactly `1.0`, never a division by zero. Extraction is a
//! pure function of the bitmap and is computed once per region.

use serde::{Deserialize, Serialize};

use crate::bitmap::Bitmap;

/// Number of entries in a feature vector
pub const FEATURE_LEN: usize = 17;

/// The 17-value geometric fingerprint of a region bitmap
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    values: [f64; FEATURE_LEN],
}

impl FeatureVector {
    /// Wraps a raw value array
    pub fn from_values(values: [f64; FEATURE_LEN]) -> Self {
        Self { values }
    }

    /// The raw values
    pub fn values(&self) -> &[f64; FEATURE_LEN] {
        &self.values
    }

    /// Extracts the fingerprint from a region bitmap
    pub fn extract(bitmap: &Bitmap) -> Self {
        let mut values = [1.0f64; FEATURE_LEN];
        let w = bitmap.width();
        let h = bitmap.height();

        // Quadrant-diagonal ratios: two counters per quadrant
        let mut filled = [0u32; 8];
        let mut total = [0u32; 8];
        let half_x = w / 2;
        let half_y = h / 2;
        for (q, (qy, qx)) in [(0, 0), (0, 1), (1, 0), (1, 1)].into_iter().enumerate() {
            let (x0, x1) = if qx == 0 { (0, half_x) } else { (half_x, w) };
            let (y0, y1) = if qy == 0 { (0, half_y) } else { (half_y, h) };
            let qw = x1 - x0;
            let qh = y1 - y0;
            for y in y0..y1 {
                for x in x0..x1 {
                    let i = (x - x0) as u64;
                    let j = (y - y0) as u64;
                    // Falling diagonal for even quadrants, rising for odd.
                    let lower = if q % 2 == 0 {
                        j * qw as u64 >= i * qh as u64
                    } else {
                        i * qh as u64 + j * qw as u64 <= (qw as u64) * (qh as u64)
                    };
                    let section = q * 2 + usize::from(!lower);
                    total[section] += 1;
                    if bitmap.is_ink(x, y) {
                        filled[section] += 1;
                    }
                }
            }
        }
        for section in 0..8 {
            if total[section] > 0 {
                values[section] = filled[section] as f64 / total[section] as f64;
            }
        }

        // Grid-third ratios
        for gy in 0..3u32 {
            for gx in 0..3u32 {
                let x0 = gx * w / 3;
                let x1 = (gx + 1) * w / 3;
                let y0 = gy * h / 3;
                let y1 = (gy + 1) * h / 3;
                let count = (x1 - x0) as u64 * (y1 - y0) as u64;
                if count == 0 {
                    continue;
                }
                let mut cell_filled = 0u64;
                for y in y0..y1 {
                    for x in x0..x1 {
                        if bitmap.is_ink(x, y) {
                            cell_filled += 1;
                        }
                    }
                }
                values[8 + (gy * 3 + gx) as usize] = cell_filled as f64 / count as f64;
            }
        }

        Self { values }
    }

    /// Sum of squared per-index differences (lower = more similar)
    pub fn distance_sq(&self, other: &FeatureVector) -> f64 {
        self.values
            .iter()
            .zip(other.values.iter())
            .map(|(a, b)| (a - b) * (a - b))
            .sum()
    }
}

impl Default for FeatureVector {
    fn default() -> Self {
        Self {
            values: [0.0; FEATURE_LEN],
        }
    }
}

/// Averages a non-empty list of feature vectors index-wise
pub fn average_features(samples: &[FeatureVector]) -> Option<FeatureVector> {
    if samples.is_empty() {
        return None;
    }
    let mut sums = [0.0f64; FEATURE_LEN];
    for sample in samples {
        for (sum, value) in sums.iter_mut().zip(sample.values.iter()) {
            *sum += value;
        }
    }
    let n = samples.len() as f64;
    for sum in sums.iter_mut() {
        *sum /= n;
    }
    Some(FeatureVector::from_values(sums))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(w: u32, h: u32) -> Bitmap {
        Bitmap::from_fn(w, h, |_, _| true).unwrap()
    }

    #[test]
    fn test_values_are_bounded() {
        let bitmap = Bitmap::from_fn(7, 5, |x, y| (x + y) % 3 == 0).unwrap();
        let fv = FeatureVector::extract(&bitmap);
        for &v in fv.values() {
            assert!((0.0..=1.0).contains(&v), "value {v} out of range");
        }
    }

    #[test]
    fn test_solid_bitmap_is_all_ones() {
        let fv = FeatureVector::extract(&solid(6, 6));
        for &v in fv.values() {
            assert_eq!(v, 1.0);
        }
    }

    #[test]
    fn test_empty_sections_yield_one_not_nan() {
        // A 1x1 bitmap has empty quadrants and empty grid cells; every
        // section ratio must be defined.
        let fv = FeatureVector::extract(&solid(1, 1));
        for &v in fv.values() {
            assert!(v.is_finite());
            assert!((0.0..=1.0).contains(&v));
        }

        let tall = Bitmap::from_fn(1, 9, |_, y| y < 3).unwrap();
        let fv = FeatureVector::extract(&tall);
        for &v in fv.values() {
            assert!(v.is_finite());
        }
        // For a single column only the gx = 2 grid cells are non-empty:
        // the top third is filled, the bottom third empty.
        assert_eq!(fv.values()[8 + 2], 1.0);
        assert_eq!(fv.values()[8 + 8], 0.0);
    }

    #[test]
    fn test_grid_thirds_localize_ink() {
        // Ink only in the top-left third
        let bitmap = Bitmap::from_fn(9, 9, |x, y| x < 3 && y < 3).unwrap();
        let fv = FeatureVector::extract(&bitmap);
        assert_eq!(fv.values()[8], 1.0);
        assert_eq!(fv.values()[16], 0.0);
    }

    #[test]
    fn test_extraction_is_deterministic() {
        let bitmap = Bitmap::from_fn(8, 11, |x, y| x * y % 4 == 1).unwrap();
        let a = FeatureVector::extract(&bitmap);
        let b = FeatureVector::extract(&bitmap);
        assert_eq!(a, b);
    }

    #[test]
    fn test_distance_sq() {
        let a = FeatureVector::from_values([0.0; FEATURE_LEN]);
        let mut values = [0.0; FEATURE_LEN];
        values[0] = 0.5;
        values[16] = 1.0;
        let b = FeatureVector::from_values(values);
        assert!((a.distance_sq(&b) - 1.25).abs() < 1e-12);
        assert_eq!(a.distance_sq(&a), 0.0);
    }

    #[test]
    fn test_average_features() {
        let a = FeatureVector::from_values([0.0; FEATURE_LEN]);
        let b = FeatureVector::from_values([1.0; FEATURE_LEN]);
        let avg = average_features(&[a, b]).unwrap();
        for &v in avg.values() {
            assert_eq!(v, 0.5);
        }
        assert!(average_features(&[]).is_none());
    }
}
