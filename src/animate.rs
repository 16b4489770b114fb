//! Wiggle animations: the two sides shown alternately as an animated GIF.
//!
//! Frames are written as lossless PNGs into a scratch directory and handed
//! to an external [`FrameEncoder`]. The default encoder runs ImageMagick:
//!
//! ```text
//! convert [-delay <delay>] -loop 0 frame-00.png frame-01.png [-resize <geometry>] out.gif
//! ```
//!
//! The scratch directory is removed afterwards whether encoding worked or
//! not.

use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use thiserror::Error;

use crate::config::AnimateConfig;
use crate::conflict::{ConflictResolver, Decision};
use crate::imaging::Quality;
use crate::render::{OutputError, SaveContext};
use crate::stereo::StereoPair;

#[derive(Error, Debug)]
pub enum EncoderError {
    #[error("could not run {program}: {source}")]
    Spawn { program: String, source: io::Error },
    #[error("{program} exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: ExitStatus,
        stderr: String,
    },
}

/// Everything an encoder needs for one animation.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationRequest<'a> {
    /// Frame files in display order.
    pub frames: &'a [PathBuf],
    /// Per-frame delay in hundredths of a second; encoder default if unset.
    pub delay: Option<u32>,
    /// Optional resize geometry, passed through verbatim (e.g. `"50%"`).
    pub resize: Option<&'a str>,
    pub output: &'a Path,
}

/// Turns frame files into one animated file.
pub trait FrameEncoder {
    fn encode(&self, request: &AnimationRequest<'_>) -> Result<(), EncoderError>;
}

/// Encoder that shells out to ImageMagick's `convert`.
#[derive(Debug, Clone)]
pub struct ImageMagickEncoder {
    program: String,
}

impl ImageMagickEncoder {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Command line for `request`, without running it.
    pub fn command(&self, request: &AnimationRequest<'_>) -> Command {
        let mut cmd = Command::new(&self.program);
        if let Some(delay) = request.delay {
            cmd.arg("-delay").arg(delay.to_string());
        }
        cmd.args(["-loop", "0"]).args(request.frames);
        if let Some(geometry) = request.resize {
            cmd.arg("-resize").arg(geometry);
        }
        cmd.arg(request.output);
        cmd
    }
}

impl Default for ImageMagickEncoder {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_ANIMATE_PROGRAM)
    }
}

impl FrameEncoder for ImageMagickEncoder {
    fn encode(&self, request: &AnimationRequest<'_>) -> Result<(), EncoderError> {
        tracing::debug!(
            program = %self.program,
            frames = request.frames.len(),
            output = %request.output.display(),
            "encoding animation"
        );
        let output = self
            .command(request)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .map_err(|source| EncoderError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(EncoderError::Failed {
                program: self.program.clone(),
                status: output.status,
                stderr: stderr.trim().to_string(),
            });
        }
        Ok(())
    }
}

/// Whether `program` can be started at all.
pub fn is_on_path(program: &str) -> bool {
    Command::new(program)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .is_ok()
}

/// A queued animation: a frozen copy of the pair plus encoder settings.
#[derive(Debug, Clone)]
pub struct AnimatedOutput {
    frames: StereoPair,
    delay: Option<u32>,
    resize: Option<String>,
}

impl AnimatedOutput {
    /// Snapshot `pair` as it is now; later edits to the pair do not show up
    /// in the animation.
    pub fn new(pair: StereoPair, config: &AnimateConfig) -> Self {
        Self {
            frames: pair,
            delay: config.delay,
            resize: config.resize.clone(),
        }
    }

    pub fn delay(&self) -> Option<u32> {
        self.delay
    }

    /// Write the frames to a scratch directory and encode them to `target`.
    pub fn save(
        self,
        target: &Path,
        ctx: SaveContext<'_>,
        quality: Quality,
    ) -> Result<(), OutputError> {
        let scratch = tempfile::Builder::new()
            .prefix("stereopair-frames-")
            .tempdir()?;

        let mut frames = self.frames;
        frames.clear_outputs();
        frames.split();
        let mut paths = Vec::new();
        for (i, output) in frames.outputs_mut().iter_mut().enumerate() {
            let path = scratch.path().join(format!("frame-{i:02}.png"));
            output.redirect(path.clone());
            paths.push(path);
        }

        let mut resolver = ConflictResolver::always(Decision::Replace);
        let result = frames.save(ctx, &mut resolver, quality).and_then(|_| {
            let request = AnimationRequest {
                frames: &paths,
                delay: self.delay,
                resize: self.resize.as_deref(),
                output: target,
            };
            ctx.encoder.encode(&request).map_err(OutputError::from)
        });

        if let Err(e) = scratch.close() {
            tracing::warn!(error = %e, "could not remove animation frames");
        }
        result
    }
}
