//! Pure calculation functions for crop boxes and dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Below this, `cos 2α` is treated as zero and the fully constrained solution
/// is undefined.
const DEGENERATE_EPSILON: f64 = 1e-10;

/// Largest axis-aligned rectangle that fits inside a `width × height`
/// rectangle rotated by `angle` radians, centered on it.
///
/// Only `|sin α|` and `|cos α|` matter, so the result is the same for `angle`,
/// `-angle` and `π - angle`. The result never exceeds the original
/// dimensions: with a fixed canvas, anything larger would sample outside the
/// rotated image.
///
/// Returns `(0.0, 0.0)` for non-positive dimensions and for the fully
/// constrained case at `cos 2α ≈ 0`.
///
/// # Examples
/// ```
/// # use stereopair::imaging::max_inscribed_rect;
/// assert_eq!(max_inscribed_rect(400.0, 300.0, 0.0), (400.0, 300.0));
///
/// let (w, h) = max_inscribed_rect(100.0, 100.0, 10f64.to_radians());
/// assert!(w < 100.0 && h < 100.0);
/// ```
pub fn max_inscribed_rect(width: f64, height: f64, angle: f64) -> (f64, f64) {
    if width <= 0.0 || height <= 0.0 {
        return (0.0, 0.0);
    }

    let width_is_longer = width >= height;
    let (long_side, short_side) = if width_is_longer {
        (width, height)
    } else {
        (height, width)
    };

    let sin_a = angle.sin().abs();
    let cos_a = angle.cos().abs();

    let (w, h) = if short_side <= 2.0 * sin_a * cos_a * long_side
        || (sin_a - cos_a).abs() < DEGENERATE_EPSILON
    {
        // Half constrained: two crop corners touch the longer sides.
        let x = 0.5 * short_side;
        if width_is_longer {
            (x / sin_a, x / cos_a)
        } else {
            (x / cos_a, x / sin_a)
        }
    } else {
        // Fully constrained: the crop touches all four sides.
        let cos_2a = cos_a * cos_a - sin_a * sin_a;
        if cos_2a.abs() < DEGENERATE_EPSILON {
            return (0.0, 0.0);
        }
        (
            (width * cos_a - height * sin_a) / cos_2a,
            (height * cos_a - width * sin_a) / cos_2a,
        )
    };

    (w.clamp(0.0, width), h.clamp(0.0, height))
}

/// Shrink the half-open interval `[a, b)` by `percentage` percent of its
/// length.
///
/// The sign of `percentage * sign` picks the trimmed end: positive trims the
/// start, negative trims the end. A zero percentage returns the interval
/// unchanged.
///
/// # Panics
/// If `b <= a`.
///
/// # Examples
/// ```
/// # use stereopair::imaging::crop_axis;
/// assert_eq!(crop_axis((0, 100), 10.0, 1), (10, 100));
/// assert_eq!(crop_axis((0, 100), 10.0, -1), (0, 90));
/// assert_eq!(crop_axis((0, 100), 0.0, -1), (0, 100));
/// ```
pub fn crop_axis(axis: (u32, u32), percentage: f64, sign: i32) -> (u32, u32) {
    let (a, b) = axis;
    assert!(b > a, "crop_axis requires b > a, got ({a}, {b})");

    let length = b - a;
    let amount = ((length as f64 * percentage.abs() / 100.0).round() as u32).min(length);
    let direction = percentage * sign as f64;

    if direction > 0.0 {
        (a + amount, b)
    } else if direction < 0.0 {
        (a, b - amount)
    } else {
        (a, b)
    }
}

/// Uniform factor that makes `size` fit inside `bounds`.
///
/// The binding dimension is the one that needs the larger shrink, so the
/// scaled result never exceeds either bound.
pub fn fit_factor(size: (u32, u32), bounds: (u32, u32)) -> f64 {
    let (w, h) = size;
    let (max_w, max_h) = bounds;
    (max_w as f64 / w as f64).min(max_h as f64 / h as f64)
}

/// Dimensions after a uniform scale, rounded and at least one pixel.
pub fn scaled_dimensions(size: (u32, u32), factor: f64) -> (u32, u32) {
    let (w, h) = size;
    (
        ((w as f64 * factor).round() as u32).max(1),
        ((h as f64 * factor).round() as u32).max(1),
    )
}

/// Offset that centers an `inner` span inside an `outer` span, rounding down.
pub fn centered_offset(outer: u32, inner: u32) -> u32 {
    outer.saturating_sub(inner) / 2
}
