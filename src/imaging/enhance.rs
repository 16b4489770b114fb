//! Per-pixel point operators.
//!
//! Every operator works through a per-channel lookup table, so the cost is
//! one table lookup per color sample regardless of the operation. Alpha
//! channels are never remapped.
//!
//! Images are expected in one of the four 8-bit layouts (`Luma8`, `LumaA8`,
//! `Rgb8`, `Rgba8`); anything else is converted with [`normalize_depth`]
//! first.

use super::histogram::{Histogram, LEVELS, Lut, equalize_table};
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageBuffer, Pixel};

/// Convert any decoded image to one of the four 8-bit layouts, keeping alpha
/// when present.
pub fn normalize_depth(img: DynamicImage) -> DynamicImage {
    match img {
        DynamicImage::ImageLuma8(_)
        | DynamicImage::ImageLumaA8(_)
        | DynamicImage::ImageRgb8(_)
        | DynamicImage::ImageRgba8(_) => img,
        other if other.color().has_alpha() => DynamicImage::ImageRgba8(other.to_rgba8()),
        other => DynamicImage::ImageRgb8(other.to_rgb8()),
    }
}

/// Number of color (non-alpha) channels.
pub fn color_channel_count(img: &DynamicImage) -> usize {
    let color = img.color();
    color.channel_count() as usize - usize::from(color.has_alpha())
}

fn map_buffer<P>(
    buf: &ImageBuffer<P, Vec<u8>>,
    color_channels: usize,
    f: &impl Fn(usize, u8) -> u8,
) -> ImageBuffer<P, Vec<u8>>
where
    P: Pixel<Subpixel = u8>,
{
    let mut out = buf.clone();
    for px in out.pixels_mut() {
        for (c, v) in px.channels_mut().iter_mut().enumerate().take(color_channels) {
            *v = f(c, *v);
        }
    }
    out
}

/// Apply `f(channel, value)` to every color sample.
fn map_channels(img: &DynamicImage, f: impl Fn(usize, u8) -> u8) -> DynamicImage {
    let n = color_channel_count(img);
    match img {
        DynamicImage::ImageLuma8(b) => DynamicImage::ImageLuma8(map_buffer(b, n, &f)),
        DynamicImage::ImageLumaA8(b) => DynamicImage::ImageLumaA8(map_buffer(b, n, &f)),
        DynamicImage::ImageRgb8(b) => DynamicImage::ImageRgb8(map_buffer(b, n, &f)),
        DynamicImage::ImageRgba8(b) => DynamicImage::ImageRgba8(map_buffer(b, n, &f)),
        other => map_channels(&normalize_depth(other.clone()), f),
    }
}

/// Remap every color sample through its channel's lookup table.
///
/// A single table is shared by all channels; otherwise channel `c` uses
/// `luts[c]` (the last table repeats if there are fewer tables than
/// channels).
///
/// # Panics
/// If `luts` is empty.
pub fn apply_luts(img: &DynamicImage, luts: &[Lut]) -> DynamicImage {
    assert!(!luts.is_empty(), "apply_luts needs at least one table");
    map_channels(img, |c, v| luts[c.min(luts.len() - 1)][v as usize])
}

fn accumulate<P>(buf: &ImageBuffer<P, Vec<u8>>, hists: &mut [Histogram])
where
    P: Pixel<Subpixel = u8>,
{
    for px in buf.pixels() {
        for (h, &v) in hists.iter_mut().zip(px.channels()) {
            h[v as usize] += 1;
        }
    }
}

/// Level frequencies of each color channel, in channel order.
pub fn channel_histograms(img: &DynamicImage) -> Vec<Histogram> {
    let mut hists = vec![[0u64; LEVELS]; color_channel_count(img)];
    match img {
        DynamicImage::ImageLuma8(b) => accumulate(b, &mut hists),
        DynamicImage::ImageLumaA8(b) => accumulate(b, &mut hists),
        DynamicImage::ImageRgb8(b) => accumulate(b, &mut hists),
        DynamicImage::ImageRgba8(b) => accumulate(b, &mut hists),
        other => return channel_histograms(&normalize_depth(other.clone())),
    }
    hists
}

fn clamp_level(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

/// Multiply every color sample by `factor` (0 gives black, 1 is unchanged).
pub fn brightness(img: &DynamicImage, factor: f32) -> DynamicImage {
    let lut: Lut = std::array::from_fn(|v| clamp_level(v as f32 * factor));
    apply_luts(img, &[lut])
}

/// Mean luma of the image, rounded to the nearest level.
fn mean_luma(img: &DynamicImage) -> f32 {
    let luma = img.to_luma8();
    let count = luma.pixels().len();
    if count == 0 {
        return 0.0;
    }
    let sum: u64 = luma.pixels().map(|p| p.0[0] as u64).sum();
    (sum as f32 / count as f32).round()
}

/// Scale every color sample's distance from the mean luma by `factor`
/// (0 gives flat gray, 1 is unchanged).
pub fn contrast(img: &DynamicImage, factor: f32) -> DynamicImage {
    let mean = mean_luma(img);
    let lut: Lut = std::array::from_fn(|v| clamp_level(mean + factor * (v as f32 - mean)));
    apply_luts(img, &[lut])
}

/// Histogram-equalize each color channel independently.
pub fn equalize(img: &DynamicImage) -> DynamicImage {
    let luts: Vec<Lut> = channel_histograms(img).iter().map(equalize_table).collect();
    apply_luts(img, &luts)
}

/// Mix two images as `a·(1 − ratio) + b·ratio`, as RGBA.
///
/// `b` is resized to `a`'s dimensions when they differ; the result is meant
/// for previews, so a cheap filter is used.
pub fn blend(a: &DynamicImage, b: &DynamicImage, ratio: f32) -> DynamicImage {
    let mut out = a.to_rgba8();
    let (w, h) = out.dimensions();
    let other = if b.dimensions() == (w, h) {
        b.to_rgba8()
    } else {
        image::imageops::resize(&b.to_rgba8(), w, h, FilterType::Triangle)
    };

    for (p, q) in out.pixels_mut().zip(other.pixels()) {
        for (x, &y) in p.0.iter_mut().zip(q.0.iter()) {
            *x = clamp_level(*x as f32 * (1.0 - ratio) + y as f32 * ratio);
        }
    }
    DynamicImage::ImageRgba8(out)
}
