//! Batch discovery: turns command-line inputs into an ordered list of pair
//! sources.
//!
//! Two kinds of input are accepted:
//!
//! ```text
//! stereopair process --left l.jpg --right r.jpg   # one pair from two files
//! stereopair process sbs1.jpg shots/              # side-by-side images
//! ```
//!
//! Directories are scanned one level deep (no recursion), entries sorted by
//! file name and filtered to extensions with a compiled-in decoder. Files
//! named explicitly must be supported images; files found in a directory
//! that are not images are ignored.

use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

use crate::imaging::is_supported_image;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Input not found: {0}")]
    NotFound(PathBuf),
    #[error("Not a supported image: {0}")]
    Unsupported(PathBuf),
    #[error("Directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("No images to process")]
    Empty,
}

/// Where one stereo pair comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PairSource {
    /// One image holding both views next to each other.
    SideBySide(PathBuf),
    /// Two images, one per eye.
    Separate { left: PathBuf, right: PathBuf },
}

impl PairSource {
    /// The path outputs are named after.
    pub fn basename(&self) -> &Path {
        match self {
            PairSource::SideBySide(path) => path,
            PairSource::Separate { left, .. } => left,
        }
    }

    /// One-line description for progress output.
    pub fn describe(&self) -> String {
        match self {
            PairSource::SideBySide(path) => path.display().to_string(),
            PairSource::Separate { left, right } => {
                format!("{} + {}", left.display(), right.display())
            }
        }
    }
}

/// Resolve inputs into pair sources, explicit pair first.
pub fn discover(
    inputs: &[PathBuf],
    explicit: Option<(PathBuf, PathBuf)>,
) -> Result<Vec<PairSource>, ScanError> {
    let mut sources = Vec::new();

    if let Some((left, right)) = explicit {
        check_image(&left)?;
        check_image(&right)?;
        sources.push(PairSource::Separate { left, right });
    }

    for input in inputs {
        if input.is_dir() {
            sources.extend(scan_dir(input)?.into_iter().map(PairSource::SideBySide));
        } else {
            check_image(input)?;
            sources.push(PairSource::SideBySide(input.clone()));
        }
    }

    if sources.is_empty() {
        return Err(ScanError::Empty);
    }
    tracing::debug!(count = sources.len(), "discovered pairs");
    Ok(sources)
}

fn check_image(path: &Path) -> Result<(), ScanError> {
    if !path.exists() {
        return Err(ScanError::NotFound(path.to_path_buf()));
    }
    if !is_supported_image(path) {
        return Err(ScanError::Unsupported(path.to_path_buf()));
    }
    Ok(())
}

/// Supported images directly inside `dir`, sorted by file name.
fn scan_dir(dir: &Path) -> Result<Vec<PathBuf>, ScanError> {
    let mut images = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry?;
        if entry.file_type().is_file() && is_supported_image(entry.path()) {
            images.push(entry.into_path());
        }
    }
    Ok(images)
}
