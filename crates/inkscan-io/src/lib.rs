//! inkscan IO - Image decoding adapter
//!
//! The recognition engine only ever sees a binary [`Bitmap`]; this crate
//! is the boundary where image container formats are decoded (via the
//! `image` crate) and thresholded to ink/background.

use std::path::Path;

use image::ImageReader;
use thiserror::Error;

use inkscan_core::{Bitmap, CoreError};

/// Default luminance threshold: pixels darker than this are ink
pub const DEFAULT_THRESHOLD: u8 = 150;

/// Errors that can occur while decoding an image into a bitmap
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Container decoding failed
    #[error("image decode error: {0}")]
    Image(#[from] image::ImageError),

    /// Filesystem error
    #[error("image I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The decoded image has an unusable extent
    #[error("core error: {0}")]
    Core(#[from] CoreError),
}

/// Result type for decode operations
pub type DecodeResult<T> = Result<T, DecodeError>;

/// Decodes an image file into a binary bitmap
///
/// The image is converted to 8-bit luminance; pixels strictly darker
/// than `threshold` become ink.
pub fn read_bitmap(path: impl AsRef<Path>, threshold: u8) -> DecodeResult<Bitmap> {
    let decoded = ImageReader::open(path)?.decode()?;
    let gray = decoded.to_luma8();
    let bitmap = Bitmap::from_fn(gray.width(), gray.height(), |x, y| {
        gray.get_pixel(x, y).0[0] < threshold
    })?;
    Ok(bitmap)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    fn temp_png(name: &str, img: &GrayImage) -> std::path::PathBuf {
        let path =
            std::env::temp_dir().join(format!("inkscan-io-{}-{name}.png", std::process::id()));
        img.save(&path).unwrap();
        path
    }

    #[test]
    fn test_threshold_splits_ink_from_background() {
        let mut img = GrayImage::from_pixel(4, 2, Luma([255u8]));
        img.put_pixel(1, 0, Luma([0u8]));
        img.put_pixel(2, 1, Luma([140u8]));
        img.put_pixel(3, 1, Luma([150u8]));
        let path = temp_png("threshold", &img);

        let bitmap = read_bitmap(&path, DEFAULT_THRESHOLD).unwrap();
        assert!(bitmap.is_ink(1, 0));
        assert!(bitmap.is_ink(2, 1));
        assert!(!bitmap.is_ink(3, 1), "threshold is exclusive");
        assert!(!bitmap.is_ink(0, 0));

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let result = read_bitmap("/nonexistent/inkscan.png", DEFAULT_THRESHOLD);
        assert!(result.is_err());
    }
}
