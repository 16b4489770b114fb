//! The stereo pair: two decoded images plus everything needed to name and
//! write what becomes of them.
//!
//! Every adjustment mutates both sides in place. Operations can run in any
//! order and never check what ran before; the only invariant kept is that
//! operations touching height leave both sides equally tall.
//!
//! ## Lifecycle
//!
//! ```text
//! load ─→ from_side_by_side / from_pair
//!           │
//!           ├─ slice / align / rotate / squash / scale / fit
//!           ├─ brightness / contrast / equalize / match_histograms
//!           ├─ merge / split / animate   (queue outputs, write nothing)
//!           ▼
//!         save(self)  ─→ default action if nothing is queued,
//!                        then each output once, in order
//! ```
//!
//! `save` takes the pair by value, so decoded buffers are released as soon
//! as its outputs are written.

use image::DynamicImage;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::animate::AnimatedOutput;
use crate::config::AnimateConfig;
use crate::conflict::{ConflictResolver, Resolution};
use crate::imaging::enhance;
use crate::imaging::histogram::{Lut, match_tables};
use crate::imaging::transform::{self, CropBox};
use crate::imaging::{
    Quality, Side, centered_offset, crop_axis, fit_factor, max_inscribed_rect, scaled_dimensions,
};
use crate::naming::Naming;
use crate::render::{
    Composite, Output, OutputError, OutputKind, SaveContext, SaveStatus, SavedOutput,
};
use crate::types::Adjustments;

#[derive(Error, Debug)]
pub enum PairError {
    #[error("Geometry error: {0}")]
    Geometry(String),
    #[error("Inconsistent pair: {0}")]
    Consistency(String),
}

/// What `save` does when no output was queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultAction {
    Merge,
    Split,
}

#[derive(Debug, Clone)]
pub struct StereoPair {
    pub left: DynamicImage,
    pub right: DynamicImage,
    basename: PathBuf,
    naming: Naming,
    outputs: Vec<Output>,
    default_action: DefaultAction,
}

impl StereoPair {
    /// Cut a side-by-side image into its two halves, dropping `middle_gap`
    /// pixels of divider from the center.
    ///
    /// Each half is `(width - middle_gap) / 2` wide; the left half starts at
    /// the left edge and the right half ends at the right edge. The pair
    /// merges back by default.
    pub fn from_side_by_side(
        image: DynamicImage,
        basename: impl Into<PathBuf>,
        naming: Naming,
        middle_gap: u32,
    ) -> Result<Self, PairError> {
        let (width, height) = (image.width(), image.height());
        let half = width.saturating_sub(middle_gap) / 2;
        if half == 0 || height == 0 {
            return Err(PairError::Geometry(format!(
                "cannot split a {width}x{height} image with a {middle_gap}px gap"
            )));
        }

        let left = transform::crop(&image, CropBox::from_spans((0, half), (0, height)));
        let right = transform::crop(
            &image,
            CropBox::from_spans((width - half, width), (0, height)),
        );
        Ok(Self::new(left, right, basename.into(), naming, DefaultAction::Merge))
    }

    /// Pair two separately loaded images. The pair splits by default.
    pub fn from_pair(
        left: DynamicImage,
        right: DynamicImage,
        basename: impl Into<PathBuf>,
        naming: Naming,
    ) -> Self {
        Self::new(left, right, basename.into(), naming, DefaultAction::Split)
    }

    fn new(
        left: DynamicImage,
        right: DynamicImage,
        basename: PathBuf,
        naming: Naming,
        default_action: DefaultAction,
    ) -> Self {
        Self {
            left,
            right,
            basename,
            naming,
            outputs: Vec::new(),
            default_action,
        }
    }

    pub fn basename(&self) -> &Path {
        &self.basename
    }

    pub fn default_action(&self) -> DefaultAction {
        self.default_action
    }

    pub fn outputs(&self) -> &[Output] {
        &self.outputs
    }

    pub(crate) fn outputs_mut(&mut self) -> &mut [Output] {
        &mut self.outputs
    }

    pub(crate) fn clear_outputs(&mut self) {
        self.outputs.clear();
    }

    /// `(width, height)` of each side.
    pub fn dimensions(&self) -> ((u32, u32), (u32, u32)) {
        (
            (self.left.width(), self.left.height()),
            (self.right.width(), self.right.height()),
        )
    }

    // =========================================================================
    // Geometry
    // =========================================================================

    /// Trim `percent` of each side's width from the inner edges (the left
    /// image's right edge, the right image's left edge). Negative values trim
    /// the outer edges.
    pub fn slice(&mut self, percent: f64) -> Result<(), PairError> {
        check_percent("slice", percent)?;
        tracing::debug!(pair = %self.basename.display(), percent, "slice");
        self.left = trim(&self.left, percent, -1, Axis::Horizontal)?;
        self.right = trim(&self.right, percent, 1, Axis::Horizontal)?;
        Ok(())
    }

    /// Trim `percent` of each side's height in opposite directions, shifting
    /// the two views vertically against each other.
    pub fn align(&mut self, percent: f64) -> Result<(), PairError> {
        check_percent("align", percent)?;
        tracing::debug!(pair = %self.basename.display(), percent, "align");
        self.left = trim(&self.left, percent, -1, Axis::Vertical)?;
        self.right = trim(&self.right, percent, 1, Axis::Vertical)?;
        Ok(())
    }

    /// Rotate the left side counter-clockwise and the right side clockwise by
    /// `degrees`, then crop both to the largest rectangle free of the
    /// uncovered corners.
    pub fn rotate(&mut self, degrees: f64) -> Result<(), PairError> {
        if !degrees.is_finite() {
            return Err(PairError::Geometry(format!("invalid rotation {degrees}")));
        }
        if degrees == 0.0 {
            return Ok(());
        }

        let width = self.left.width().min(self.right.width());
        let height = self.left.height().min(self.right.height());
        let (w, h) = max_inscribed_rect(f64::from(width), f64::from(height), degrees.to_radians());
        let (w, h) = (w.floor() as u32, h.floor() as u32);
        if w == 0 || h == 0 {
            return Err(PairError::Geometry(format!(
                "rotating {width}x{height} by {degrees}° leaves no usable area"
            )));
        }

        tracing::debug!(pair = %self.basename.display(), degrees, crop_w = w, crop_h = h, "rotate");
        self.left = crop_centered(&transform::rotate(&self.left, degrees), w, h);
        self.right = crop_centered(&transform::rotate(&self.right, -degrees), w, h);
        Ok(())
    }

    /// Halve the height of both sides, for displays that stretch vertically.
    pub fn squash(&mut self) {
        tracing::debug!(pair = %self.basename.display(), "squash");
        for side in [&mut self.left, &mut self.right] {
            let (w, h) = (side.width(), side.height());
            *side = transform::resize(side, w, (h / 2).max(1));
        }
    }

    /// Resize both sides uniformly by `factor`.
    pub fn scale(&mut self, factor: f64) -> Result<(), PairError> {
        if !(factor.is_finite() && factor > 0.0) {
            return Err(PairError::Geometry(format!(
                "scale factor must be positive, got {factor}"
            )));
        }
        if factor == 1.0 {
            return Ok(());
        }

        tracing::debug!(pair = %self.basename.display(), factor, "scale");
        for side in [&mut self.left, &mut self.right] {
            let (w, h) = scaled_dimensions((side.width(), side.height()), factor);
            *side = transform::resize(side, w, h);
        }
        Ok(())
    }

    /// Scale uniformly so neither side exceeds `bounds`.
    pub fn fit(&mut self, bounds: (u32, u32)) -> Result<(), PairError> {
        if bounds.0 == 0 || bounds.1 == 0 {
            return Err(PairError::Geometry(format!(
                "cannot fit into {}x{}",
                bounds.0, bounds.1
            )));
        }
        let extent = (
            self.left.width().max(self.right.width()),
            self.left.height().max(self.right.height()),
        );
        self.scale(fit_factor(extent, bounds))
    }

    // =========================================================================
    // Tone
    // =========================================================================

    /// Pull both sides' tone distributions toward their average, channel by
    /// channel. Alpha is left alone.
    pub fn match_histograms(&mut self) -> Result<(), PairError> {
        if self.left.color() != self.right.color() {
            return Err(PairError::Consistency(format!(
                "cannot match {:?} against {:?}",
                self.left.color(),
                self.right.color()
            )));
        }

        tracing::debug!(pair = %self.basename.display(), "match histograms");
        let left_hists = enhance::channel_histograms(&self.left);
        let right_hists = enhance::channel_histograms(&self.right);
        let (left_luts, right_luts): (Vec<Lut>, Vec<Lut>) = left_hists
            .iter()
            .zip(&right_hists)
            .map(|(l, r)| match_tables(l, r))
            .unzip();

        self.left = enhance::apply_luts(&self.left, &left_luts);
        self.right = enhance::apply_luts(&self.right, &right_luts);
        Ok(())
    }

    /// Equalize each side's histogram on its own.
    pub fn equalize(&mut self) {
        tracing::debug!(pair = %self.basename.display(), "equalize");
        self.left = enhance::equalize(&self.left);
        self.right = enhance::equalize(&self.right);
    }

    pub fn brightness(&mut self, factor: f64) {
        tracing::debug!(pair = %self.basename.display(), factor, "brightness");
        self.left = enhance::brightness(&self.left, factor as f32);
        self.right = enhance::brightness(&self.right, factor as f32);
    }

    pub fn contrast(&mut self, factor: f64) {
        tracing::debug!(pair = %self.basename.display(), factor, "contrast");
        self.left = enhance::contrast(&self.left, factor as f32);
        self.right = enhance::contrast(&self.right, factor as f32);
    }

    /// Apply `adj` in fixed order: brightness, contrast, slice, align,
    /// rotate. Identity values are skipped.
    pub fn apply_adjustments(&mut self, adj: &Adjustments) -> Result<(), PairError> {
        if adj.brightness != 1.0 {
            self.brightness(adj.brightness);
        }
        if adj.contrast != 1.0 {
            self.contrast(adj.contrast);
        }
        if adj.slice != 0.0 {
            self.slice(adj.slice)?;
        }
        if adj.align != 0.0 {
            self.align(adj.align)?;
        }
        if adj.rotate != 0.0 {
            self.rotate(adj.rotate)?;
        }
        Ok(())
    }

    // =========================================================================
    // Outputs
    // =========================================================================

    fn output_path(&self, suffixes: &[&str], extension: Option<&str>) -> PathBuf {
        self.naming.output_path(&self.basename, suffixes, extension)
    }

    pub fn add_output(&mut self, output: Output) {
        self.outputs.push(output);
    }

    /// Queue the two sides joined into one side-by-side image.
    pub fn merge(&mut self) {
        let path = self.output_path(&[], None);
        self.add_output(Output::new(path, OutputKind::Still(Composite::Merged)));
    }

    /// Queue each side as its own image.
    pub fn split(&mut self) {
        for side in [Side::Left, Side::Right] {
            let path = self.output_path(&[side.as_str()], None);
            self.add_output(Output::new(path, OutputKind::Still(Composite::Single(side))));
        }
    }

    /// Queue an animation of the pair as it is right now.
    pub fn animate(&mut self, config: &AnimateConfig) {
        let snapshot = Self::new(
            self.left.clone(),
            self.right.clone(),
            self.basename.clone(),
            self.naming.clone(),
            self.default_action,
        );
        let path = self.output_path(&[], Some("gif"));
        let animation = AnimatedOutput::new(snapshot, config);
        self.add_output(Output::new(path, OutputKind::Animated(Box::new(animation))));
    }

    /// Write every queued output, or the default action's if none is queued.
    ///
    /// Conflicts are resolved per output right before it is written. A
    /// skipped still output is still rendered so composition errors surface;
    /// a skipped animation is not encoded at all.
    pub fn save(
        mut self,
        ctx: SaveContext<'_>,
        resolver: &mut ConflictResolver,
        quality: Quality,
    ) -> Result<Vec<SavedOutput>, OutputError> {
        if self.outputs.is_empty() {
            match self.default_action {
                DefaultAction::Merge => self.merge(),
                DefaultAction::Split => self.split(),
            }
        }

        let outputs = std::mem::take(&mut self.outputs);
        check_distinct_targets(&outputs)?;
        let mut saved = Vec::with_capacity(outputs.len());
        for output in outputs {
            let (path, kind) = output.into_parts();
            let label = kind.label();
            let resolution = resolver.resolve(&path)?;

            match kind {
                OutputKind::Still(composite) => {
                    let image = composite.render(&self.left, &self.right)?;
                    if resolution != Resolution::Skip {
                        ctx.backend.save(&image, &path, quality)?;
                    }
                }
                OutputKind::Animated(animation) => {
                    if resolution != Resolution::Skip {
                        animation.save(&path, ctx, quality)?;
                    }
                }
            }

            let status = match resolution {
                Resolution::Write => SaveStatus::Written,
                Resolution::Replaced => SaveStatus::Replaced,
                Resolution::Skip => SaveStatus::Skipped,
            };
            if status == SaveStatus::Skipped {
                tracing::info!(path = %path.display(), "kept existing file");
            } else {
                tracing::info!(path = %path.display(), kind = label, "wrote output");
            }
            saved.push(SavedOutput {
                path,
                label,
                status,
            });
        }
        Ok(saved)
    }
}

#[derive(Clone, Copy)]
enum Axis {
    Horizontal,
    Vertical,
}

/// Fail before anything is written when two outputs would land on one file.
fn check_distinct_targets(outputs: &[Output]) -> Result<(), OutputError> {
    let mut seen = HashSet::new();
    for output in outputs {
        if !seen.insert(output.path()) {
            return Err(OutputError::SharedTarget(output.path().to_path_buf()));
        }
    }
    Ok(())
}

fn check_percent(what: &str, percent: f64) -> Result<(), PairError> {
    if percent.is_finite() && percent.abs() < 100.0 {
        Ok(())
    } else {
        Err(PairError::Geometry(format!(
            "{what} must be within (-100, 100), got {percent}"
        )))
    }
}

fn trim(img: &DynamicImage, percent: f64, sign: i32, axis: Axis) -> Result<DynamicImage, PairError> {
    let (width, height) = (img.width(), img.height());
    let area = match axis {
        Axis::Horizontal => CropBox::from_spans(crop_axis((0, width), percent, sign), (0, height)),
        Axis::Vertical => CropBox::from_spans((0, width), crop_axis((0, height), percent, sign)),
    };
    if area.width == 0 || area.height == 0 {
        return Err(PairError::Geometry(format!(
            "trimming {percent}% of {width}x{height} leaves nothing"
        )));
    }
    Ok(transform::crop(img, area))
}

fn crop_centered(img: &DynamicImage, width: u32, height: u32) -> DynamicImage {
    let area = CropBox {
        x: centered_offset(img.width(), width),
        y: centered_offset(img.height(), height),
        width,
        height,
    };
    transform::crop(img, area)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animate::tests::RecordingEncoder;
    use crate::conflict::Decision;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};
    use crate::test_helpers::{gradient, mean_abs_diff, side_by_side, solid};
    use image::GenericImageView;

    fn pair(w: u32, h: u32) -> StereoPair {
        StereoPair::from_pair(gradient(w, h), gradient(w, h), "shots/beach.png", Naming::default())
    }

    fn save_all(pair: StereoPair, backend: &MockBackend) -> Vec<SavedOutput> {
        let encoder = RecordingEncoder::new();
        let ctx = SaveContext {
            backend,
            encoder: &encoder,
        };
        let mut resolver = ConflictResolver::always(Decision::Abort);
        pair.save(ctx, &mut resolver, Quality::default()).unwrap()
    }

    // ===== construction tests =====

    #[test]
    fn side_by_side_halves() {
        let left = solid(50, 20, [255, 0, 0]);
        let right = solid(50, 20, [0, 0, 255]);
        let p = StereoPair::from_side_by_side(
            side_by_side(&left, &right),
            "x.png",
            Naming::default(),
            0,
        )
        .unwrap();
        assert_eq!(p.left.as_bytes(), left.as_bytes());
        assert_eq!(p.right.as_bytes(), right.as_bytes());
        assert_eq!(p.default_action(), DefaultAction::Merge);
    }

    #[test]
    fn side_by_side_drops_middle_gap() {
        let img = side_by_side(&solid(40, 10, [255, 0, 0]), &solid(40, 10, [0, 0, 255]));
        let p = StereoPair::from_side_by_side(img, "x.png", Naming::default(), 10).unwrap();
        assert_eq!(p.dimensions(), ((35, 10), (35, 10)));
        assert!(p.left.pixels().all(|(_, _, px)| px.0 == [255, 0, 0, 255]));
        assert!(p.right.pixels().all(|(_, _, px)| px.0 == [0, 0, 255, 255]));
    }

    #[test]
    fn side_by_side_gap_too_wide() {
        let result =
            StereoPair::from_side_by_side(gradient(10, 10), "x.png", Naming::default(), 9);
        assert!(matches!(result, Err(PairError::Geometry(_))));
    }

    #[test]
    fn separate_images_split_by_default() {
        assert_eq!(pair(4, 4).default_action(), DefaultAction::Split);
    }

    // ===== geometry tests =====

    #[test]
    fn slice_trims_inner_edges() {
        let mut p = pair(100, 50);
        let original = p.left.clone();
        p.slice(10.0).unwrap();
        assert_eq!(p.dimensions(), ((90, 50), (90, 50)));
        // Left keeps its left edge, right keeps its right edge.
        assert_eq!(p.left.get_pixel(0, 0), original.get_pixel(0, 0));
        assert_eq!(p.right.get_pixel(89, 0), original.get_pixel(99, 0));
    }

    #[test]
    fn negative_slice_trims_outer_edges() {
        let mut p = pair(100, 50);
        let original = p.left.clone();
        p.slice(-10.0).unwrap();
        assert_eq!(p.left.get_pixel(0, 0), original.get_pixel(10, 0));
        assert_eq!(p.right.get_pixel(0, 0), original.get_pixel(0, 0));
    }

    #[test]
    fn slice_then_unslice_is_lossy() {
        let mut p = pair(100, 50);
        p.slice(10.0).unwrap();
        p.slice(-10.0).unwrap();
        assert_ne!(p.dimensions().0, (100, 50));
        assert_eq!(p.dimensions().0.0, 81);
    }

    #[test]
    fn slice_zero_is_noop() {
        let mut p = pair(30, 20);
        let before = p.left.clone();
        p.slice(0.0).unwrap();
        assert_eq!(p.left.as_bytes(), before.as_bytes());
    }

    #[test]
    fn slice_out_of_range_errors() {
        assert!(matches!(pair(10, 10).slice(100.0), Err(PairError::Geometry(_))));
        assert!(matches!(pair(10, 10).slice(f64::NAN), Err(PairError::Geometry(_))));
    }

    #[test]
    fn slice_to_nothing_errors() {
        let mut p = pair(1, 4);
        assert!(matches!(p.slice(60.0), Err(PairError::Geometry(_))));
    }

    #[test]
    fn align_keeps_heights_equal() {
        let mut p = pair(40, 100);
        let original = p.left.clone();
        p.align(5.0).unwrap();
        assert_eq!(p.dimensions(), ((40, 95), (40, 95)));
        assert_eq!(p.left.get_pixel(0, 0), original.get_pixel(0, 0));
        assert_eq!(p.right.get_pixel(0, 0), original.get_pixel(0, 5));
    }

    #[test]
    fn rotate_shrinks_both_sides_equally() {
        let mut p = pair(100, 100);
        p.rotate(10.0).unwrap();
        let (l, r) = p.dimensions();
        assert_eq!(l, r);
        assert!(l.0 < 100 && l.1 < 100);
        assert!(l.0 > 50 && l.1 > 50);
    }

    #[test]
    fn rotate_zero_is_noop() {
        let mut p = pair(20, 10);
        let before = p.left.clone();
        p.rotate(0.0).unwrap();
        assert_eq!(p.left.as_bytes(), before.as_bytes());
    }

    #[test]
    fn rotate_crop_has_no_black_corners() {
        let mut p = StereoPair::from_pair(
            solid(80, 60, [200, 200, 200]),
            solid(80, 60, [200, 200, 200]),
            "x.png",
            Naming::default(),
        );
        p.rotate(15.0).unwrap();
        let (w, h) = p.left.dimensions();
        for (x, y) in [(0, 0), (w - 1, 0), (0, h - 1), (w - 1, h - 1)] {
            for side in [&p.left, &p.right] {
                let px = side.get_pixel(x, y).0;
                assert!(px[0] >= 195, "corner ({x},{y}) is {px:?}");
            }
        }
    }

    #[test]
    fn rotate_crops_to_inscribed_rect() {
        let mut p = pair(100, 100);
        p.rotate(10.0).unwrap();
        let (w, h) = max_inscribed_rect(100.0, 100.0, 10f64.to_radians());
        let expected = (w.floor() as u32, h.floor() as u32);
        assert_eq!(expected, (86, 86));
        assert_eq!(p.dimensions(), (expected, expected));
    }

    #[test]
    fn rotate_nan_errors() {
        assert!(matches!(pair(10, 10).rotate(f64::NAN), Err(PairError::Geometry(_))));
    }

    #[test]
    fn squash_halves_height() {
        let mut p = pair(40, 31);
        p.squash();
        assert_eq!(p.dimensions(), ((40, 15), (40, 15)));
    }

    #[test]
    fn scale_resizes_both() {
        let mut p = pair(40, 20);
        p.scale(0.5).unwrap();
        assert_eq!(p.dimensions(), ((20, 10), (20, 10)));
    }

    #[test]
    fn scale_rejects_non_positive() {
        assert!(matches!(pair(4, 4).scale(0.0), Err(PairError::Geometry(_))));
        assert!(matches!(pair(4, 4).scale(-2.0), Err(PairError::Geometry(_))));
    }

    #[test]
    fn fit_bounds_the_larger_side() {
        let mut p = StereoPair::from_pair(
            gradient(200, 100),
            gradient(100, 100),
            "x.png",
            Naming::default(),
        );
        p.fit((100, 100)).unwrap();
        let (l, r) = p.dimensions();
        assert_eq!(l, (100, 50));
        assert_eq!(r, (50, 50));
    }

    #[test]
    fn fit_zero_bounds_errors() {
        assert!(matches!(pair(4, 4).fit((0, 10)), Err(PairError::Geometry(_))));
    }

    // ===== tone tests =====

    #[test]
    fn match_histograms_converges() {
        let dark = enhance::brightness(&gradient(64, 64), 0.5);
        let mut p = StereoPair::from_pair(dark, gradient(64, 64), "x.png", Naming::default());

        let before = p.clone();
        p.match_histograms().unwrap();
        let first = mean_abs_diff(&before.left, &p.left);

        let mid = p.clone();
        p.match_histograms().unwrap();
        let second = mean_abs_diff(&mid.left, &p.left);

        assert!(first > 0.0);
        assert!(second < first, "second pass {second} vs first {first}");
    }

    #[test]
    fn match_histograms_brings_sides_closer() {
        let dark = enhance::brightness(&gradient(64, 64), 0.5);
        let mut p = StereoPair::from_pair(dark, gradient(64, 64), "x.png", Naming::default());
        let before = mean_abs_diff(&p.left, &p.right);
        p.match_histograms().unwrap();
        assert!(mean_abs_diff(&p.left, &p.right) < before);
    }

    #[test]
    fn match_histograms_rejects_mixed_layouts() {
        let mut p = StereoPair::from_pair(
            gradient(4, 4),
            DynamicImage::ImageRgba8(gradient(4, 4).to_rgba8()),
            "x.png",
            Naming::default(),
        );
        assert!(matches!(p.match_histograms(), Err(PairError::Consistency(_))));
    }

    #[test]
    fn identity_adjustments_change_nothing() {
        let mut p = pair(30, 20);
        let before = p.clone();
        p.apply_adjustments(&Adjustments::default()).unwrap();
        assert_eq!(p.left.as_bytes(), before.left.as_bytes());
        assert_eq!(p.right.as_bytes(), before.right.as_bytes());
    }

    #[test]
    fn adjustments_apply_geometry() {
        let mut p = pair(100, 100);
        let adj = Adjustments {
            slice: 10.0,
            align: 10.0,
            ..Adjustments::default()
        };
        p.apply_adjustments(&adj).unwrap();
        assert_eq!(p.dimensions(), ((90, 90), (90, 90)));
    }

    // ===== output tests =====

    #[test]
    fn operations_queue_nothing() {
        let mut p = pair(10, 10);
        p.slice(10.0).unwrap();
        p.equalize();
        assert!(p.outputs().is_empty());
    }

    #[test]
    fn split_queues_named_sides() {
        let mut p = pair(10, 10);
        p.split();
        let paths: Vec<_> = p.outputs().iter().map(|o| o.path().to_path_buf()).collect();
        assert_eq!(
            paths,
            vec![
                PathBuf::from("shots/beach-left.png"),
                PathBuf::from("shots/beach-right.png")
            ]
        );
    }

    #[test]
    fn animate_names_gif() {
        let mut p = pair(10, 10);
        p.animate(&AnimateConfig::default());
        assert_eq!(p.outputs()[0].path(), Path::new("shots/beach.gif"));
        assert_eq!(p.outputs()[0].kind().label(), "animation");
    }

    #[test]
    fn save_runs_default_merge() {
        let backend = MockBackend::new();
        let img = side_by_side(&gradient(20, 10), &gradient(20, 10));
        let p = StereoPair::from_side_by_side(img.clone(), "in/sbs.png", Naming::default(), 0)
            .unwrap();

        let saved = save_all(p, &backend);
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].status, SaveStatus::Written);
        let out = backend.saved("in/sbs.png").unwrap();
        assert_eq!(out.as_bytes(), img.as_bytes());
    }

    #[test]
    fn save_runs_default_split() {
        let backend = MockBackend::new();
        let saved = save_all(pair(8, 8), &backend);
        let labels: Vec<_> = saved.iter().map(|s| s.label).collect();
        assert_eq!(labels, ["left", "right"]);
        assert!(backend.saved("shots/beach-left.png").is_some());
        assert!(backend.saved("shots/beach-right.png").is_some());
    }

    #[test]
    fn outputs_render_final_state() {
        let backend = MockBackend::new();
        let mut p = pair(100, 100);
        p.split();
        p.slice(10.0).unwrap();
        save_all(p, &backend);
        let left = backend.saved("shots/beach-left.png").unwrap();
        assert_eq!(left.dimensions(), (90, 100));
    }

    #[test]
    fn save_passes_quality() {
        let backend = MockBackend::new();
        let encoder = RecordingEncoder::new();
        let ctx = SaveContext {
            backend: &backend,
            encoder: &encoder,
        };
        let mut p = pair(6, 4);
        p.merge();
        p.save(ctx, &mut ConflictResolver::always(Decision::Abort), Quality::new(60))
            .unwrap();
        assert!(backend.get_operations().contains(&RecordedOp::Save {
            path: "shots/beach.png".to_string(),
            width: 12,
            height: 4,
            quality: 60,
        }));
    }

    #[test]
    fn merge_height_mismatch_fails_at_save() {
        let backend = MockBackend::new();
        let encoder = RecordingEncoder::new();
        let ctx = SaveContext {
            backend: &backend,
            encoder: &encoder,
        };
        let mut p = StereoPair::from_pair(gradient(4, 4), gradient(4, 6), "x.png", Naming::default());
        p.merge();
        let result = p.save(ctx, &mut ConflictResolver::always(Decision::Abort), Quality::default());
        assert!(matches!(result, Err(OutputError::Pair(PairError::Consistency(_)))));
        assert!(backend.get_operations().is_empty());
    }

    fn exact_path_naming() -> Naming {
        Naming {
            dest_path: Some(PathBuf::from("out.png")),
            ..Naming::default()
        }
    }

    #[test]
    fn exact_path_split_fails_before_writing() {
        let backend = MockBackend::new();
        let encoder = RecordingEncoder::new();
        let ctx = SaveContext {
            backend: &backend,
            encoder: &encoder,
        };
        let p = StereoPair::from_pair(gradient(8, 8), gradient(8, 8), "x.png", exact_path_naming());
        let result = p.save(ctx, &mut ConflictResolver::always(Decision::Abort), Quality::default());
        assert!(matches!(result, Err(OutputError::SharedTarget(path)) if path == Path::new("out.png")));
        assert!(backend.get_operations().is_empty());
    }

    #[test]
    fn exact_path_single_merge_is_written() {
        let backend = MockBackend::new();
        let mut p = StereoPair::from_pair(gradient(8, 8), gradient(8, 8), "x.png", exact_path_naming());
        p.merge();
        let saved = save_all(p, &backend);
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].path, PathBuf::from("out.png"));
        assert_eq!(backend.saved("out.png").unwrap().dimensions(), (16, 8));
    }

    #[test]
    fn animation_snapshot_ignores_later_edits() {
        let tmp = tempfile::TempDir::new().unwrap();
        let backend = MockBackend::new();
        let encoder = RecordingEncoder::new();
        let ctx = SaveContext {
            backend: &backend,
            encoder: &encoder,
        };
        let naming = Naming {
            dest_dir: Some(tmp.path().to_path_buf()),
            ..Naming::default()
        };
        let mut p = StereoPair::from_pair(gradient(40, 20), gradient(40, 20), "beach.png", naming);
        let config = AnimateConfig {
            delay: Some(12),
            resize: Some("50%".to_string()),
            ..AnimateConfig::default()
        };
        p.animate(&config);
        p.scale(0.5).unwrap();
        p.save(ctx, &mut ConflictResolver::always(Decision::Abort), Quality::default())
            .unwrap();

        let calls = encoder.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].output, tmp.path().join("beach.gif"));
        assert_eq!(calls[0].delay, Some(12));
        assert_eq!(calls[0].resize.as_deref(), Some("50%"));
        assert_eq!(calls[0].frames.len(), 2);

        // Frames were saved at the size the pair had when queued.
        for frame in &calls[0].frames {
            assert_eq!(backend.saved(frame).unwrap().dimensions(), (40, 20));
        }
        // Scratch directory is gone.
        assert!(!calls[0].frames[0].parent().unwrap().exists());
    }
}
