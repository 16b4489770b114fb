//! The per-pair pipeline.
//!
//! For every discovered source, in order:
//!
//! ```text
//! load ─→ [interactive session] ─→ configured adjustments ─→ actions ─→ save
//! ```
//!
//! One pair is fully written before the next is loaded. Progress is reported
//! as [`ProcessEvent`]s over an optional channel; the CLI prints them from a
//! separate thread.
//!
//! ## Actions
//!
//! Actions run in command-line order after the configured adjustments:
//!
//! | Syntax | Effect |
//! |---|---|
//! | `brightness=F`, `contrast=F` | tone multipliers |
//! | `slice=P`, `align=P`, `rotate=D` | geometry, as in `[adjust]` |
//! | `squash` | halve the height |
//! | `scale=F`, `fit=WxH` | uniform resize |
//! | `match`, `equalize` | histogram operations |
//! | `merge`, `split`, `animate` | queue outputs |
//!
//! With no output action the pair's default applies: side-by-side sources
//! are merged back, separate left/right files are split.

use std::fmt;
use std::str::FromStr;
use std::sync::mpsc::Sender;
use thiserror::Error;

use crate::animate::ImageMagickEncoder;
use crate::config::{AnimateConfig, OnError, StereoConfig};
use crate::conflict::ConflictResolver;
use crate::imaging::{BackendError, ImageBackend, Quality, RustBackend};
use crate::interactive::{Controller, SessionError, run_session};
use crate::naming::Naming;
use crate::render::{OutputError, SaveContext, SaveStatus, SavedOutput};
use crate::scan::PairSource;
use crate::stereo::{PairError, StereoPair};

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("Cancelled")]
    Cancelled,
    #[error("Image load failed: {0}")]
    Imaging(#[from] BackendError),
    #[error(transparent)]
    Pair(#[from] PairError),
    #[error(transparent)]
    Output(#[from] OutputError),
    #[error("Interactive session failed: {0}")]
    Session(SessionError),
    #[error("output.dest_path names a single file but {0} pairs were given")]
    DestPathWithBatch(usize),
}

impl ProcessError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ProcessError::Cancelled)
    }
}

impl From<SessionError> for ProcessError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::Cancelled => ProcessError::Cancelled,
            SessionError::Pair(e) => ProcessError::Pair(e),
            other => ProcessError::Session(other),
        }
    }
}

// ============================================================================
// Actions
// ============================================================================

#[derive(Error, Debug, PartialEq)]
pub enum ActionParseError {
    #[error("unknown action '{0}'")]
    Unknown(String),
    #[error("{0} needs a value, e.g. {0}=1.5")]
    MissingValue(&'static str),
    #[error("{0} takes no value")]
    UnexpectedValue(&'static str),
    #[error("invalid value '{value}' for {action}")]
    InvalidValue { action: &'static str, value: String },
}

/// One step requested on the command line.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Brightness(f64),
    Contrast(f64),
    Slice(f64),
    Align(f64),
    Rotate(f64),
    Squash,
    Scale(f64),
    Fit(u32, u32),
    Match,
    Equalize,
    Merge,
    Split,
    Animate,
}

type Constructor = fn(&'static str, Option<&str>) -> Result<Action, ActionParseError>;

/// Action tags and how to build each from its optional `=value`.
const ACTIONS: &[(&str, Constructor)] = &[
    ("brightness", |tag, v| Ok(Action::Brightness(number(tag, v)?))),
    ("contrast", |tag, v| Ok(Action::Contrast(number(tag, v)?))),
    ("slice", |tag, v| Ok(Action::Slice(number(tag, v)?))),
    ("align", |tag, v| Ok(Action::Align(number(tag, v)?))),
    ("rotate", |tag, v| Ok(Action::Rotate(number(tag, v)?))),
    ("squash", |tag, v| flag(tag, v, Action::Squash)),
    ("scale", |tag, v| Ok(Action::Scale(number(tag, v)?))),
    ("fit", |tag, v| {
        let (w, h) = bounds(tag, v)?;
        Ok(Action::Fit(w, h))
    }),
    ("match", |tag, v| flag(tag, v, Action::Match)),
    ("equalize", |tag, v| flag(tag, v, Action::Equalize)),
    ("merge", |tag, v| flag(tag, v, Action::Merge)),
    ("split", |tag, v| flag(tag, v, Action::Split)),
    ("animate", |tag, v| flag(tag, v, Action::Animate)),
];

fn number(tag: &'static str, value: Option<&str>) -> Result<f64, ActionParseError> {
    let value = value.ok_or(ActionParseError::MissingValue(tag))?;
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ActionParseError::InvalidValue {
            action: tag,
            value: value.to_string(),
        })
}

fn bounds(tag: &'static str, value: Option<&str>) -> Result<(u32, u32), ActionParseError> {
    let value = value.ok_or(ActionParseError::MissingValue(tag))?;
    let invalid = || ActionParseError::InvalidValue {
        action: tag,
        value: value.to_string(),
    };
    let (w, h) = value.split_once(['x', 'X']).ok_or_else(invalid)?;
    let w = w.trim().parse().map_err(|_| invalid())?;
    let h = h.trim().parse().map_err(|_| invalid())?;
    Ok((w, h))
}

fn flag(tag: &'static str, value: Option<&str>, action: Action) -> Result<Action, ActionParseError> {
    match value {
        None => Ok(action),
        Some(_) => Err(ActionParseError::UnexpectedValue(tag)),
    }
}

impl FromStr for Action {
    type Err = ActionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, value) = match s.split_once('=') {
            Some((name, value)) => (name.trim(), Some(value)),
            None => (s.trim(), None),
        };
        let (tag, construct) = ACTIONS
            .iter()
            .find(|(tag, _)| *tag == name)
            .ok_or_else(|| ActionParseError::Unknown(name.to_string()))?;
        construct(tag, value)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Brightness(v) => write!(f, "brightness={v}"),
            Action::Contrast(v) => write!(f, "contrast={v}"),
            Action::Slice(v) => write!(f, "slice={v}"),
            Action::Align(v) => write!(f, "align={v}"),
            Action::Rotate(v) => write!(f, "rotate={v}"),
            Action::Squash => f.write_str("squash"),
            Action::Scale(v) => write!(f, "scale={v}"),
            Action::Fit(w, h) => write!(f, "fit={w}x{h}"),
            Action::Match => f.write_str("match"),
            Action::Equalize => f.write_str("equalize"),
            Action::Merge => f.write_str("merge"),
            Action::Split => f.write_str("split"),
            Action::Animate => f.write_str("animate"),
        }
    }
}

impl Action {
    pub fn apply(&self, pair: &mut StereoPair, animate: &AnimateConfig) -> Result<(), PairError> {
        match *self {
            Action::Brightness(f) => pair.brightness(f),
            Action::Contrast(f) => pair.contrast(f),
            Action::Slice(p) => pair.slice(p)?,
            Action::Align(p) => pair.align(p)?,
            Action::Rotate(d) => pair.rotate(d)?,
            Action::Squash => pair.squash(),
            Action::Scale(f) => pair.scale(f)?,
            Action::Fit(w, h) => pair.fit((w, h))?,
            Action::Match => pair.match_histograms()?,
            Action::Equalize => pair.equalize(),
            Action::Merge => pair.merge(),
            Action::Split => pair.split(),
            Action::Animate => pair.animate(animate),
        }
        Ok(())
    }
}

// ============================================================================
// Progress events
// ============================================================================

/// Progress reported while a batch runs.
#[derive(Debug, Clone)]
pub enum ProcessEvent {
    PairStarted {
        index: usize,
        total: usize,
        source: String,
    },
    PairSaved {
        index: usize,
        outputs: Vec<SavedOutput>,
    },
    PairFailed {
        index: usize,
        source: String,
        error: String,
    },
}

/// Totals for a finished batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessSummary {
    pub pairs: usize,
    pub failed: usize,
    pub written: usize,
    pub skipped: usize,
}

impl fmt::Display for ProcessSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} pairs, {} outputs written, {} kept, {} failed",
            self.pairs, self.written, self.skipped, self.failed
        )
    }
}

// ============================================================================
// Pipeline
// ============================================================================

/// What to run over which sources.
pub struct Batch<'a> {
    pub sources: &'a [PairSource],
    pub config: &'a StereoConfig,
    pub actions: &'a [Action],
}

/// Run a batch with the production image backend and encoder.
pub fn process(
    batch: &Batch<'_>,
    resolver: &mut ConflictResolver,
    controller: Option<&mut (dyn Controller + '_)>,
    events: Option<Sender<ProcessEvent>>,
) -> Result<ProcessSummary, ProcessError> {
    let backend = RustBackend::new();
    let encoder = ImageMagickEncoder::new(batch.config.animate.program.as_str());
    let ctx = SaveContext {
        backend: &backend,
        encoder: &encoder,
    };
    process_with_backend(ctx, batch, resolver, controller, events)
}

/// Run a batch against the given collaborators (allows testing with mocks).
pub fn process_with_backend(
    ctx: SaveContext<'_>,
    batch: &Batch<'_>,
    resolver: &mut ConflictResolver,
    mut controller: Option<&mut (dyn Controller + '_)>,
    events: Option<Sender<ProcessEvent>>,
) -> Result<ProcessSummary, ProcessError> {
    let config = batch.config;
    if config.output.dest_path.is_some() && batch.sources.len() > 1 {
        return Err(ProcessError::DestPathWithBatch(batch.sources.len()));
    }

    let send = |event: ProcessEvent| {
        if let Some(tx) = &events {
            tx.send(event).ok();
        }
    };

    let mut summary = ProcessSummary::default();
    for (i, source) in batch.sources.iter().enumerate() {
        let index = i + 1;
        send(ProcessEvent::PairStarted {
            index,
            total: batch.sources.len(),
            source: source.describe(),
        });

        match process_pair(ctx, source, batch, resolver, controller.as_deref_mut()) {
            Ok(outputs) => {
                summary.pairs += 1;
                for saved in &outputs {
                    match saved.status {
                        SaveStatus::Skipped => summary.skipped += 1,
                        _ => summary.written += 1,
                    }
                }
                send(ProcessEvent::PairSaved { index, outputs });
            }
            Err(e) if e.is_cancelled() => return Err(e),
            Err(e) => {
                summary.failed += 1;
                send(ProcessEvent::PairFailed {
                    index,
                    source: source.describe(),
                    error: e.to_string(),
                });
                match config.batch.on_error {
                    OnError::Abort => return Err(e),
                    OnError::Skip => {
                        tracing::warn!(source = %source.describe(), error = %e, "skipping pair");
                    }
                }
            }
        }
    }
    Ok(summary)
}

fn process_pair(
    ctx: SaveContext<'_>,
    source: &PairSource,
    batch: &Batch<'_>,
    resolver: &mut ConflictResolver,
    controller: Option<&mut (dyn Controller + '_)>,
) -> Result<Vec<SavedOutput>, ProcessError> {
    let config = batch.config;
    let mut pair = load_pair(
        ctx.backend,
        source,
        config.output.naming(),
        config.batch.middle_gap,
    )?;

    let adjustments = match controller {
        Some(controller) => run_session(
            &pair,
            config.adjust,
            config.interactive.preview_size,
            controller,
        )?,
        None => config.adjust,
    };
    pair.apply_adjustments(&adjustments)?;

    for action in batch.actions {
        tracing::debug!(%action, "applying action");
        action.apply(&mut pair, &config.animate)?;
    }

    Ok(pair.save(ctx, resolver, Quality::new(config.output.quality))?)
}

/// Decode a source into a pair.
pub fn load_pair(
    backend: &dyn ImageBackend,
    source: &PairSource,
    naming: Naming,
    middle_gap: u32,
) -> Result<StereoPair, ProcessError> {
    match source {
        PairSource::SideBySide(path) => {
            let image = backend.load(path)?;
            Ok(StereoPair::from_side_by_side(
                image,
                path.clone(),
                naming,
                middle_gap,
            )?)
        }
        PairSource::Separate { left, right } => {
            let left_image = backend.load(left)?;
            let right_image = backend.load(right)?;
            Ok(StereoPair::from_pair(
                left_image,
                right_image,
                left.clone(),
                naming,
            ))
        }
    }
}
