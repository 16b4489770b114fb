//! # stereopair
//!
//! Batch processing for stereoscopic image pairs. A pair is either one
//! side-by-side image or two separate files, one per eye. Each pair is
//! loaded, corrected, and written back out as a merged side-by-side image,
//! two separate images, or a "wiggle" animation.
//!
//! # Pipeline
//!
//! ```text
//! discover ─→ load ─→ [interactive tuning] ─→ adjust ─→ actions ─→ save
//!   scan       process   interactive           stereo     process   render
//! ```
//!
//! Pairs are handled strictly one after another. A pair owns its two
//! decoded images plus a queue of pending outputs; nothing is rendered
//! until `save`, which consumes the pair so its buffers are released before
//! the next one loads.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`scan`] | Turns command-line inputs into an ordered list of pair sources |
//! | [`stereo`] | The `StereoPair` value: geometry, tone and output queueing |
//! | [`render`] | Output descriptions and composition of the two sides |
//! | [`animate`] | Wiggle animations through an external frame encoder |
//! | [`conflict`] | What to do when an output file already exists |
//! | [`interactive`] | Live preview session for tuning adjustments |
//! | [`process`] | Per-pair pipeline, action parsing, progress events |
//! | [`config`] | Layered `stereopair.toml` loading, merging, and validation |
//! | [`naming`] | Output path derivation from a source path |
//! | [`types`] | `Adjustments`, the per-pair correction values |
//! | [`imaging`] | Pure-Rust pixel operations behind an `ImageBackend` trait |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Geometry Before Tone, Config Before Actions
//!
//! The configured `[adjust]` values (or the values chosen interactively)
//! apply first, in a fixed order: tone, then slice, align and rotate.
//! Command-line actions follow in the order given. Rotation crops to the
//! largest rectangle free of uncovered corners, so both sides stay the same
//! size and merge cleanly.
//!
//! ## Outputs Are Data
//!
//! `merge`, `split` and `animate` only queue an [`render::Output`]. The
//! destination is fixed when queued, the pixels when saved. An animation
//! takes a snapshot of the pair, so later edits do not leak into it.
//!
//! ## External Encoder Only for Animations
//!
//! Stills are encoded in-process with the `image` crate. Animated GIFs are
//! handed to ImageMagick (`convert`), which produces far better palettes.
//! The encoder sits behind the [`animate::FrameEncoder`] trait, so tests
//! never need ImageMagick installed.

pub mod animate;
pub mod config;
pub mod conflict;
pub mod imaging;
pub mod interactive;
pub mod naming;
pub mod output;
pub mod process;
pub mod render;
pub mod scan;
pub mod stereo;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
