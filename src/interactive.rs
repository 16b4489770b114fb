//! Interactive tuning of the adjustments for one pair.
//!
//! A session works on a small copy of the pair. Each round it applies the
//! current [`Adjustments`] to a fresh clone of that thumbnail, blends the two
//! sides half and half into one preview (misalignment shows as ghosting),
//! hands it to a [`Controller`] and acts on the returned [`Control`]:
//!
//! | Control | Effect |
//! |---|---|
//! | `Nudge(knob, delta)` | add `delta` to one value (brightness/contrast floor at 0) |
//! | `Reset` | back to the values the session started with |
//! | `Commit` | end the session with the current values |
//! | `Cancel` | end the session with [`SessionError::Cancelled`] |
//!
//! A nudge that makes the pair unrenderable (say, slicing away everything)
//! is rolled back and reported on the next preview.

use image::DynamicImage;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

use crate::config::StepConfig;
use crate::imaging::enhance::blend;
use crate::stereo::{PairError, StereoPair};
use crate::types::Adjustments;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Interactive session cancelled")]
    Cancelled,
    #[error("Controller failed: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Pair(#[from] PairError),
}

/// One tunable adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Knob {
    Brightness,
    Contrast,
    Slice,
    Align,
    Rotate,
}

impl Knob {
    pub const ALL: [Knob; 5] = [
        Knob::Brightness,
        Knob::Contrast,
        Knob::Slice,
        Knob::Align,
        Knob::Rotate,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Knob::Brightness => "brightness",
            Knob::Contrast => "contrast",
            Knob::Slice => "slice",
            Knob::Align => "align",
            Knob::Rotate => "rotate",
        }
    }

    fn value_mut(self, adj: &mut Adjustments) -> &mut f64 {
        match self {
            Knob::Brightness => &mut adj.brightness,
            Knob::Contrast => &mut adj.contrast,
            Knob::Slice => &mut adj.slice,
            Knob::Align => &mut adj.align,
            Knob::Rotate => &mut adj.rotate,
        }
    }

    fn step(self, steps: &StepConfig) -> f64 {
        match self {
            Knob::Brightness => steps.brightness,
            Knob::Contrast => steps.contrast,
            Knob::Slice => steps.slice,
            Knob::Align => steps.align,
            Knob::Rotate => steps.rotate,
        }
    }

    /// Add `delta` to this knob's value in `adj`.
    pub fn nudge(self, adj: &mut Adjustments, delta: f64) {
        let value = self.value_mut(adj);
        *value += delta;
        if matches!(self, Knob::Brightness | Knob::Contrast) {
            *value = value.max(0.0);
        }
    }
}

impl FromStr for Knob {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Knob::ALL
            .into_iter()
            .find(|k| k.name() == s)
            .ok_or_else(|| format!("unknown setting '{s}'"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Control {
    Nudge(Knob, f64),
    Reset,
    Commit,
    Cancel,
}

/// What a controller is shown each round.
pub struct Preview<'a> {
    /// Both sides blended at 50%.
    pub image: &'a DynamicImage,
    pub adjustments: &'a Adjustments,
    /// Set when the previous control was rolled back.
    pub notice: Option<&'a str>,
}

/// The operator side of a session.
pub trait Controller {
    fn next_control(&mut self, preview: &Preview<'_>) -> io::Result<Control>;
}

/// Let a controller tune the adjustments for `pair`, starting from
/// `initial`. The pair itself is not modified.
pub fn run_session(
    pair: &StereoPair,
    initial: Adjustments,
    preview_size: u32,
    controller: &mut dyn Controller,
) -> Result<Adjustments, SessionError> {
    let thumbnail = thumbnail(pair, preview_size)?;
    let mut current = initial;
    let mut preview = render_preview(&thumbnail, &current)?;
    let mut notice: Option<String> = None;

    loop {
        let control = controller.next_control(&Preview {
            image: &preview,
            adjustments: &current,
            notice: notice.as_deref(),
        })?;
        notice = None;

        let next = match control {
            Control::Commit => {
                tracing::debug!(adjustments = ?current, "session committed");
                return Ok(current);
            }
            Control::Cancel => return Err(SessionError::Cancelled),
            Control::Reset => initial,
            Control::Nudge(knob, delta) => {
                let mut next = current;
                knob.nudge(&mut next, delta);
                next
            }
        };

        match render_preview(&thumbnail, &next) {
            Ok(image) => {
                current = next;
                preview = image;
            }
            Err(e) => {
                tracing::debug!(error = %e, "preview rejected");
                notice = Some(e.to_string());
            }
        }
    }
}

/// A copy of `pair` no larger than `preview_size` on either edge.
fn thumbnail(pair: &StereoPair, preview_size: u32) -> Result<StereoPair, PairError> {
    let mut thumb = pair.clone();
    let ((lw, lh), (rw, rh)) = thumb.dimensions();
    if lw.max(lh).max(rw).max(rh) > preview_size {
        thumb.fit((preview_size, preview_size))?;
    }
    Ok(thumb)
}

fn render_preview(thumbnail: &StereoPair, adj: &Adjustments) -> Result<DynamicImage, PairError> {
    let mut pair = thumbnail.clone();
    pair.apply_adjustments(adj)?;
    Ok(blend(&pair.left, &pair.right, 0.5))
}

/// Terminal controller reading one command per line.
///
/// ```text
/// rotate 0.5        nudge by an explicit amount
/// slice +           nudge by the configured step
/// align -
/// reset | ok | cancel
/// ```
///
/// End of input cancels. When a preview path is set the blended preview is
/// written there before every prompt, for viewing in an external program.
pub struct LineController<R, W> {
    input: R,
    output: W,
    steps: StepConfig,
    preview_path: Option<PathBuf>,
}

impl<R: BufRead, W: Write> LineController<R, W> {
    pub fn new(input: R, output: W, steps: StepConfig) -> Self {
        Self {
            input,
            output,
            steps,
            preview_path: None,
        }
    }

    pub fn with_preview_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.preview_path = Some(path.into());
        self
    }
}

impl LineController<io::BufReader<io::Stdin>, io::Stderr> {
    /// Commands from stdin, unbuffered so a conflict prompt can share it.
    pub fn stdio(steps: StepConfig) -> Self {
        Self::new(io::BufReader::with_capacity(1, io::stdin()), io::stderr(), steps)
    }
}

/// Current values as one line.
pub fn format_adjustments(adj: &Adjustments) -> String {
    format!(
        "brightness={:.2} contrast={:.2} slice={:.2} align={:.2} rotate={:.2}",
        adj.brightness, adj.contrast, adj.slice, adj.align, adj.rotate
    )
}

/// Parse one command line. `Ok(None)` for a blank line.
pub fn parse_control(line: &str, steps: &StepConfig) -> Result<Option<Control>, String> {
    let mut words = line.split_whitespace();
    let Some(first) = words.next() else {
        return Ok(None);
    };
    let control = match first {
        "ok" | "commit" => Control::Commit,
        "cancel" | "quit" => Control::Cancel,
        "reset" => Control::Reset,
        name => {
            let knob: Knob = name.parse()?;
            let delta = match words.next() {
                Some("+") => knob.step(steps),
                Some("-") => -knob.step(steps),
                Some(amount) => amount
                    .parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .ok_or_else(|| format!("invalid amount '{amount}'"))?,
                None => return Err(format!("missing amount for {name}")),
            };
            Control::Nudge(knob, delta)
        }
    };
    match words.next() {
        Some(extra) => Err(format!("unexpected '{extra}'")),
        None => Ok(Some(control)),
    }
}

impl<R: BufRead, W: Write> Controller for LineController<R, W> {
    fn next_control(&mut self, preview: &Preview<'_>) -> io::Result<Control> {
        if let Some(path) = &self.preview_path {
            preview.image.save(path).map_err(io::Error::other)?;
        }
        if let Some(notice) = preview.notice {
            writeln!(self.output, "rejected: {notice}")?;
        }
        writeln!(self.output, "{}", format_adjustments(preview.adjustments))?;

        loop {
            write!(self.output, "> ")?;
            self.output.flush()?;

            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                return Ok(Control::Cancel);
            }
            match parse_control(&line, &self.steps) {
                Ok(Some(control)) => return Ok(control),
                Ok(None) => {}
                Err(msg) => writeln!(self.output, "{msg}")?,
            }
        }
    }
}
