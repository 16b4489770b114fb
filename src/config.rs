//! Configuration loading, validating, and merging.
//!
//! Configuration is layered: stock defaults are overridden by an optional
//! `stereopair.toml` (in the working directory, or wherever `--config`
//! points), which is overridden by command-line flags. Each layer is a sparse
//! TOML table merged onto the one below with [`merge_toml`]; the result is
//! deserialized once and validated.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [adjust]
//! brightness = 1.0      # multiplier
//! contrast = 1.0        # multiplier around mean luma
//! slice = 0.0           # % trimmed from inner edges (negative: outer)
//! align = 0.0           # % vertical shift between sides
//! rotate = 0.0          # degrees, left counter-clockwise
//!
//! [output]
//! suffix = "stereo"     # appended to every output stem
//! separator = "-"
//! quality = 85          # JPEG quality (1-100)
//! force = false         # replace existing outputs without asking
//! # dest_dir = "out"    # write next to the source when unset
//! # dest_path = "x.jpg" # exact output path (single pair only)
//!
//! [animate]
//! program = "convert"   # ImageMagick binary
//! # delay = 20          # hundredths of a second per frame
//! # resize = "50%"      # ImageMagick geometry
//!
//! [batch]
//! middle_gap = 0        # divider pixels between side-by-side halves
//! on_error = "abort"    # or "skip" to continue with the next pair
//!
//! [interactive]
//! preview_size = 800    # longest preview edge in pixels
//!
//! [interactive.steps]
//! brightness = 0.05
//! contrast = 0.05
//! slice = 0.5
//! align = 0.25
//! rotate = 0.25
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::naming::{DEFAULT_SEPARATOR, Naming};
use crate::types::Adjustments;

/// Config file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "stereopair.toml";

/// Animation encoder used unless configured otherwise.
pub const DEFAULT_ANIMATE_PROGRAM: &str = "convert";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Full configuration. Every section has defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StereoConfig {
    /// Adjustments applied to every pair before any action.
    pub adjust: Adjustments,
    /// Output naming, quality and overwrite policy.
    pub output: OutputConfig,
    /// Animated output settings.
    pub animate: AnimateConfig,
    /// Batch discovery and failure policy.
    pub batch: BatchConfig,
    /// Interactive session tuning.
    pub interactive: InteractiveConfig,
}

impl StereoConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let adj = &self.adjust;
        if !(1..=100).contains(&self.output.quality) {
            return Err(ConfigError::Validation(
                "output.quality must be 1-100".into(),
            ));
        }
        if !(adj.brightness.is_finite() && adj.brightness >= 0.0) {
            return Err(ConfigError::Validation(
                "adjust.brightness must be >= 0".into(),
            ));
        }
        if !(adj.contrast.is_finite() && adj.contrast >= 0.0) {
            return Err(ConfigError::Validation(
                "adjust.contrast must be >= 0".into(),
            ));
        }
        for (name, value) in [("slice", adj.slice), ("align", adj.align)] {
            if !(value.is_finite() && value.abs() < 100.0) {
                return Err(ConfigError::Validation(format!(
                    "adjust.{name} must be within (-100, 100)"
                )));
            }
        }
        if !adj.rotate.is_finite() {
            return Err(ConfigError::Validation(
                "adjust.rotate must be a finite number".into(),
            ));
        }
        if self.animate.program.trim().is_empty() {
            return Err(ConfigError::Validation(
                "animate.program must not be empty".into(),
            ));
        }
        if self.interactive.preview_size == 0 {
            return Err(ConfigError::Validation(
                "interactive.preview_size must be non-zero".into(),
            ));
        }
        if !self.interactive.steps.all_positive() {
            return Err(ConfigError::Validation(
                "interactive.steps values must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Output naming and writing settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Appended to every output stem; empty for none.
    pub suffix: String,
    /// Directory for outputs. Defaults to the source's directory.
    pub dest_dir: Option<PathBuf>,
    /// Exact output path. Only meaningful for a single pair.
    pub dest_path: Option<PathBuf>,
    /// Joins stem, suffix and per-output suffixes.
    pub separator: String,
    /// JPEG encoding quality (1 = worst, 100 = best).
    pub quality: u32,
    /// Replace existing outputs without asking.
    pub force: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            suffix: "stereo".to_string(),
            dest_dir: None,
            dest_path: None,
            separator: DEFAULT_SEPARATOR.to_string(),
            quality: 85,
            force: false,
        }
    }
}

impl OutputConfig {
    pub fn naming(&self) -> Naming {
        Naming {
            suffix: self.suffix.clone(),
            dest_dir: self.dest_dir.clone(),
            dest_path: self.dest_path.clone(),
            separator: self.separator.clone(),
        }
    }
}

/// Animated output settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnimateConfig {
    /// Frame delay in hundredths of a second. Encoder default when absent.
    pub delay: Option<u32>,
    /// ImageMagick resize geometry applied to every frame.
    pub resize: Option<String>,
    /// Encoder executable.
    pub program: String,
}

impl Default for AnimateConfig {
    fn default() -> Self {
        Self {
            delay: None,
            resize: None,
            program: DEFAULT_ANIMATE_PROGRAM.to_string(),
        }
    }
}

/// What a batch does when one pair fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnError {
    /// Stop at the first failed pair.
    #[default]
    Abort,
    /// Report the failure and continue with the next pair.
    Skip,
}

/// Batch discovery and failure policy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatchConfig {
    /// Divider width, in pixels, between the halves of a side-by-side image.
    pub middle_gap: u32,
    pub on_error: OnError,
}

/// Interactive session settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InteractiveConfig {
    /// Longest edge of the preview thumbnail.
    pub preview_size: u32,
    /// Increments used by the `+`/`-` shorthand.
    pub steps: StepConfig,
}

impl Default for InteractiveConfig {
    fn default() -> Self {
        Self {
            preview_size: 800,
            steps: StepConfig::default(),
        }
    }
}

/// Per-knob increments for the interactive session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StepConfig {
    pub brightness: f64,
    pub contrast: f64,
    pub slice: f64,
    pub align: f64,
    pub rotate: f64,
}

impl Default for StepConfig {
    fn default() -> Self {
        Self {
            brightness: 0.05,
            contrast: 0.05,
            slice: 0.5,
            align: 0.25,
            rotate: 0.25,
        }
    }
}

impl StepConfig {
    fn all_positive(&self) -> bool {
        [
            self.brightness,
            self.contrast,
            self.slice,
            self.align,
            self.rotate,
        ]
        .iter()
        .all(|v| v.is_finite() && *v > 0.0)
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(StereoConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// The config file to use: `explicit` if given, else `stereopair.toml` in
/// `dir` when it exists.
pub fn find_config_file(dir: &Path, explicit: Option<&Path>) -> Option<PathBuf> {
    match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => {
            let candidate = dir.join(CONFIG_FILE_NAME);
            candidate.exists().then_some(candidate)
        }
    }
}

/// Read a config file as a raw TOML value.
///
/// Returns `Err` if the file is missing or contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<toml::Value, ConfigError> {
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(value)
}

/// Merge overlays onto a base value in order, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlays: impl IntoIterator<Item = toml::Value>,
) -> Result<StereoConfig, ConfigError> {
    let merged = overlays.into_iter().fold(base, merge_toml);
    let config: StereoConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the effective configuration.
///
/// Stock defaults, then `file` (if any), then `overrides` (typically built
/// from command-line flags). Unknown keys are rejected at every layer.
pub fn load_config(
    file: Option<&Path>,
    overrides: Option<toml::Value>,
) -> Result<StereoConfig, ConfigError> {
    let file_layer = file.map(load_raw_config).transpose()?;
    tracing::debug!(file = ?file, "loading configuration");
    resolve_config(
        stock_defaults_value(),
        file_layer.into_iter().chain(overrides),
    )
}

/// Returns a fully-commented stock `stereopair.toml` with all keys and
/// explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# stereopair configuration
# ========================
#
# All options are optional. Values shown are the defaults.
# Place this file as stereopair.toml in the working directory, or pass
# --config <file>. Command-line flags override anything set here.
# Unknown keys are rejected.

# ---------------------------------------------------------------------------
# Adjustments applied to every pair, in this order, before any action.
# ---------------------------------------------------------------------------
[adjust]
# Brightness multiplier (1.0 = unchanged).
brightness = 1.0
# Contrast multiplier around the mean luma (1.0 = unchanged).
contrast = 1.0
# Percent of width trimmed from the inner edges of both sides.
# Negative values trim the outer edges instead.
slice = 0.0
# Percent of height trimmed in opposite directions per side, shifting the
# views vertically against each other.
align = 0.0
# Degrees of opposing rotation: left counter-clockwise, right clockwise.
# Both sides are cropped to the largest rectangle without blank corners.
rotate = 0.0

# ---------------------------------------------------------------------------
# Output naming and writing.
# ---------------------------------------------------------------------------
[output]
# Appended to every output stem: beach.jpg -> beach-stereo.jpg.
suffix = "stereo"
# Joins stem, suffix and side names: beach-stereo-left.jpg.
separator = "-"
# JPEG quality, 1-100. Other formats are lossless.
quality = 85
# Replace existing outputs without asking.
force = false
# Write all outputs into this directory instead of next to the source.
# dest_dir = "out"
# Exact output path. Only sensible when processing a single pair.
# dest_path = "final.jpg"

# ---------------------------------------------------------------------------
# Animated (wiggle) output. Requires ImageMagick.
# ---------------------------------------------------------------------------
[animate]
# Encoder executable. Use "magick" for ImageMagick 7 without the legacy shim.
program = "convert"
# Delay between frames in hundredths of a second.
# delay = 20
# Resize geometry applied to each frame, e.g. "50%" or "800x".
# resize = "50%"

# ---------------------------------------------------------------------------
# Batch behaviour.
# ---------------------------------------------------------------------------
[batch]
# Divider strip, in pixels, between the halves of side-by-side sources.
middle_gap = 0
# "abort" stops at the first failed pair; "skip" reports it and continues.
on_error = "abort"

# ---------------------------------------------------------------------------
# Interactive session (--interactive).
# ---------------------------------------------------------------------------
[interactive]
# Longest edge of the preview thumbnail, in pixels.
preview_size = 800

# Increments applied by the "+" / "-" shorthand.
[interactive.steps]
brightness = 0.05
contrast = 0.05
slice = 0.5
align = 0.25
rotate = 0.25
"##
}
