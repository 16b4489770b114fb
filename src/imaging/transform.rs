//! Geometric primitives over decoded images: crop, resize, rotate and
//! horizontal concatenation.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Crop | `DynamicImage::crop_imm` |
//! | Resize | `DynamicImage::resize_exact` with `Lanczos3` |
//! | Rotate | `imageproc::geometric_transformations::rotate_about_center`, bicubic |
//! | Concatenate | `DynamicImage::new` + `imageops::replace` |

use image::imageops::{self, FilterType};
use image::{DynamicImage, GenericImageView, ImageBuffer, Luma, LumaA, Pixel, Rgb, Rgba};
use imageproc::geometric_transformations::{Interpolation, rotate_about_center};

/// Crop box in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropBox {
    /// Box spanning the half-open intervals `[x0, x1)` and `[y0, y1)`.
    pub fn from_spans(horizontal: (u32, u32), vertical: (u32, u32)) -> Self {
        Self {
            x: horizontal.0,
            y: vertical.0,
            width: horizontal.1 - horizontal.0,
            height: vertical.1 - vertical.0,
        }
    }
}

pub fn crop(img: &DynamicImage, area: CropBox) -> DynamicImage {
    img.crop_imm(area.x, area.y, area.width, area.height)
}

/// Resize to exact dimensions with Lanczos3.
pub fn resize(img: &DynamicImage, width: u32, height: u32) -> DynamicImage {
    img.resize_exact(width, height, FilterType::Lanczos3)
}

/// Border replicated around an image before rotating. Bicubic sampling
/// reaches two pixels past the point being sampled.
const ROTATION_MARGIN: u32 = 4;

/// Rotate counter-clockwise by `degrees` about the center, bicubic, keeping
/// the canvas size. Uncovered corners are filled with black; samples taken
/// just outside the source read its replicated border instead.
pub fn rotate(img: &DynamicImage, degrees: f64) -> DynamicImage {
    // imageproc rotates clockwise for positive angles.
    let theta = (-degrees).to_radians() as f32;
    let bicubic = Interpolation::Bicubic;
    let m = ROTATION_MARGIN;
    match img {
        DynamicImage::ImageLuma8(b) => DynamicImage::ImageLuma8(unpad(
            &rotate_about_center(&pad_edges(b, m), theta, bicubic, Luma([0])),
            m,
            b.dimensions(),
        )),
        DynamicImage::ImageLumaA8(b) => DynamicImage::ImageLumaA8(unpad(
            &rotate_about_center(&pad_edges(b, m), theta, bicubic, LumaA([0, 0])),
            m,
            b.dimensions(),
        )),
        DynamicImage::ImageRgb8(b) => DynamicImage::ImageRgb8(unpad(
            &rotate_about_center(&pad_edges(b, m), theta, bicubic, Rgb([0, 0, 0])),
            m,
            b.dimensions(),
        )),
        other => {
            let b = other.to_rgba8();
            DynamicImage::ImageRgba8(unpad(
                &rotate_about_center(&pad_edges(&b, m), theta, bicubic, Rgba([0, 0, 0, 0])),
                m,
                b.dimensions(),
            ))
        }
    }
}

/// Grow `buf` by `margin` on every edge, copying the nearest border pixel.
fn pad_edges<P>(buf: &ImageBuffer<P, Vec<u8>>, margin: u32) -> ImageBuffer<P, Vec<u8>>
where
    P: Pixel<Subpixel = u8>,
{
    let (w, h) = buf.dimensions();
    if w == 0 || h == 0 {
        return buf.clone();
    }
    ImageBuffer::from_fn(w + 2 * margin, h + 2 * margin, |x, y| {
        let sx = x.saturating_sub(margin).min(w - 1);
        let sy = y.saturating_sub(margin).min(h - 1);
        *buf.get_pixel(sx, sy)
    })
}

/// Cut the original canvas back out of a padded buffer.
fn unpad<P>(buf: &ImageBuffer<P, Vec<u8>>, margin: u32, size: (u32, u32)) -> ImageBuffer<P, Vec<u8>>
where
    P: Pixel<Subpixel = u8> + 'static,
{
    if buf.dimensions() == size {
        return buf.clone();
    }
    imageops::crop_imm(buf, margin, margin, size.0, size.1).to_image()
}

/// Place `right` directly after `left` on a canvas of the taller height.
///
/// The canvas uses `left`'s color type; callers check that both sides agree.
pub fn concat_horizontal(left: &DynamicImage, right: &DynamicImage) -> DynamicImage {
    let (lw, lh) = left.dimensions();
    let (rw, rh) = right.dimensions();
    let mut canvas = DynamicImage::new(lw + rw, lh.max(rh), left.color());
    image::imageops::replace(&mut canvas, left, 0, 0);
    image::imageops::replace(&mut canvas, right, lw as i64, 0);
    canvas
}
