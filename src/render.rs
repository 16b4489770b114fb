//! Queued outputs of a stereo pair.
//!
//! Operations on a [`StereoPair`](crate::stereo::StereoPair) only record
//! *what* should be written; pixels are composed at save time from the
//! pair's final state. That way `split` followed by `rotate` still writes
//! rotated halves.
//!
//! | Kind | Composition | Default path |
//! |---|---|---|
//! | `Still(Merged)` | left ‖ right, side by side | `<stem><sep><suffix>.<ext>` |
//! | `Still(Single(side))` | that side alone | `<stem><sep><suffix><sep><side>.<ext>` |
//! | `Animated` | both sides as frames of a GIF | `<stem><sep><suffix>.gif` |

use std::borrow::Cow;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::animate::{AnimatedOutput, EncoderError, FrameEncoder};
use crate::conflict::ConflictError;
use crate::imaging::transform::concat_horizontal;
use crate::imaging::{BackendError, ImageBackend, Side};
use crate::stereo::PairError;
use image::DynamicImage;

#[derive(Error, Debug)]
pub enum OutputError {
    #[error(transparent)]
    Conflict(#[from] ConflictError),
    #[error(transparent)]
    Pair(#[from] PairError),
    #[error("Image write failed: {0}")]
    Backend(#[from] BackendError),
    #[error("Animation failed: {0}")]
    Encoder(#[from] EncoderError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{} is the target of more than one output (output.dest_path suits a single output only)", .0.display())]
    SharedTarget(PathBuf),
}

/// A single still image derived from the pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Composite {
    Merged,
    Single(Side),
}

impl Composite {
    /// Compose the still from the pair's current sides.
    ///
    /// Single sides are borrowed; only the merged image allocates.
    pub fn render<'a>(
        self,
        left: &'a DynamicImage,
        right: &'a DynamicImage,
    ) -> Result<Cow<'a, DynamicImage>, OutputError> {
        match self {
            Composite::Single(Side::Left) => Ok(Cow::Borrowed(left)),
            Composite::Single(Side::Right) => Ok(Cow::Borrowed(right)),
            Composite::Merged => {
                if left.height() != right.height() {
                    return Err(PairError::Consistency(format!(
                        "sides differ in height ({} vs {})",
                        left.height(),
                        right.height()
                    ))
                    .into());
                }
                if left.color() != right.color() {
                    return Err(PairError::Consistency(format!(
                        "sides differ in color layout ({:?} vs {:?})",
                        left.color(),
                        right.color()
                    ))
                    .into());
                }
                Ok(Cow::Owned(concat_horizontal(left, right)))
            }
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Composite::Merged => "merge",
            Composite::Single(side) => side.as_str(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum OutputKind {
    Still(Composite),
    Animated(Box<AnimatedOutput>),
}

impl OutputKind {
    pub fn label(&self) -> &'static str {
        match self {
            OutputKind::Still(composite) => composite.label(),
            OutputKind::Animated(_) => "animation",
        }
    }
}

/// A pending file write.
#[derive(Debug, Clone)]
pub struct Output {
    path: PathBuf,
    kind: OutputKind,
    redirected: bool,
}

impl Output {
    pub fn new(path: PathBuf, kind: OutputKind) -> Self {
        Self {
            path,
            kind,
            redirected: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> &OutputKind {
        &self.kind
    }

    /// Send this output somewhere else. Allowed once per output.
    ///
    /// # Panics
    /// If the output was already redirected.
    pub fn redirect(&mut self, path: PathBuf) {
        assert!(
            !self.redirected,
            "output {} already redirected",
            self.path.display()
        );
        self.path = path;
        self.redirected = true;
    }

    pub(crate) fn into_parts(self) -> (PathBuf, OutputKind) {
        (self.path, self.kind)
    }
}

/// Collaborators needed to write outputs.
#[derive(Clone, Copy)]
pub struct SaveContext<'a> {
    pub backend: &'a dyn ImageBackend,
    pub encoder: &'a dyn FrameEncoder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveStatus {
    Written,
    Replaced,
    Skipped,
}

/// What happened to one output.
#[derive(Debug, Clone, PartialEq)]
pub struct SavedOutput {
    pub path: PathBuf,
    pub label: &'static str,
    pub status: SaveStatus,
}
