//! Image processing in pure Rust, no system libraries.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify / decode / encode** | `image` crate |
//! | **Rotate** | `imageproc` bicubic rotation |
//! | **Crop / resize / concatenate** | `image` crate, Lanczos3 |
//! | **Brightness / contrast / equalize / match** | lookup tables over 8-bit channels |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for crop and dimension math (unit testable)
//! - **Histogram**: Pure functions turning tone distributions into lookup tables
//! - **Enhance / Transform**: Pixel operations over decoded images
//! - **Parameters**: Small value types shared with backends
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]

pub mod backend;
mod calculations;
pub mod enhance;
pub mod histogram;
mod params;
pub mod rust_backend;
pub mod transform;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use calculations::{
    centered_offset, crop_axis, fit_factor, max_inscribed_rect, scaled_dimensions,
};
pub use params::{Quality, Side};
pub use rust_backend::{RustBackend, is_supported_image, supported_input_extensions};
pub use transform::CropBox;
