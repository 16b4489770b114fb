//! Shared test utilities for the stereopair test suite.
//!
//! Synthetic images with known pixel content, plus a few comparisons that
//! are awkward to spell out inline.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let img = gradient(64, 32);
//! let sbs = side_by_side(&img, &solid(64, 32, [255, 0, 0]));
//! assert_eq!(sbs.width(), 128);
//! ```

use image::{DynamicImage, GenericImageView, Rgb, RgbImage};
use std::path::Path;

use crate::imaging::transform::concat_horizontal;

// =========================================================================
// Synthetic images
// =========================================================================

/// RGB image whose red channel ramps along x, green along y, blue constant.
///
/// Every pixel in a row differs from its neighbours, so crops and shifts are
/// detectable by comparing bytes.
pub fn gradient(width: u32, height: u32) -> DynamicImage {
    let img = RgbImage::from_fn(width, height, |x, y| {
        let r = (x * 255 / width.max(2).saturating_sub(1)).min(255) as u8;
        let g = (y * 255 / height.max(2).saturating_sub(1)).min(255) as u8;
        Rgb([r, g, 128])
    });
    DynamicImage::ImageRgb8(img)
}

/// Uniform RGB image.
pub fn solid(width: u32, height: u32, color: [u8; 3]) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb(color)))
}

/// Two images placed next to each other, as a side-by-side source.
pub fn side_by_side(left: &DynamicImage, right: &DynamicImage) -> DynamicImage {
    concat_horizontal(left, right)
}

/// Encode `img` as PNG at `path`, creating parent directories.
pub fn write_png(path: &Path, img: &DynamicImage) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    img.save_with_format(path, image::ImageFormat::Png).unwrap();
}

// =========================================================================
// Comparisons
// =========================================================================

/// Mean absolute per-sample difference between two same-sized images.
///
/// # Panics
/// If the dimensions differ.
pub fn mean_abs_diff(a: &DynamicImage, b: &DynamicImage) -> f64 {
    assert_eq!(a.dimensions(), b.dimensions(), "images differ in size");
    let (a, b) = (a.to_rgb8(), b.to_rgb8());
    let total: u64 = a
        .as_raw()
        .iter()
        .zip(b.as_raw())
        .map(|(&x, &y)| u64::from(x.abs_diff(y)))
        .sum();
    total as f64 / a.as_raw().len().max(1) as f64
}

/// Mean over all color samples.
pub fn mean_level(img: &DynamicImage) -> f64 {
    let raw = img.to_rgb8().into_raw();
    raw.iter().map(|&v| f64::from(v)).sum::<f64>() / raw.len().max(1) as f64
}
