//! Output file naming.
//!
//! Every output is named after the source it came from. For a source
//! `shots/beach.jpg`, suffix `3d` and separator `-`:
//!
//! | Output | Path |
//! |---|---|
//! | merged | `shots/beach-3d.jpg` |
//! | split, left | `shots/beach-3d-left.jpg` |
//! | animation | `shots/beach-3d.gif` |
//!
//! With `dest_dir = "out"` the directory part is replaced: `out/beach-3d.jpg`.
//! An explicit `dest_path` overrides everything and is used verbatim.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Separator between the stem and each suffix component.
pub const DEFAULT_SEPARATOR: &str = "-";

/// Result of splitting a source file name.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedName {
    /// File name without the last extension.
    pub stem: String,
    /// Last extension without the dot, if any.
    pub extension: Option<String>,
}

/// Split a file name into stem and extension.
///
/// - `"beach.jpg"` → stem="beach", extension=Some("jpg")
/// - `"beach.final.png"` → stem="beach.final", extension=Some("png")
/// - `"beach"` → stem="beach", extension=None
/// - `".hidden"` → stem=".hidden", extension=None
pub fn split_basename(name: &Path) -> ParsedName {
    let stem = name
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = name
        .extension()
        .map(|e| e.to_string_lossy().into_owned());
    ParsedName { stem, extension }
}

/// Where and how outputs are named. Threaded in from configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Naming {
    /// Appended to every output stem. Empty means no suffix.
    pub suffix: String,
    /// Directory for outputs; defaults to the source's directory.
    pub dest_dir: Option<PathBuf>,
    /// Exact output path; wins over everything else.
    pub dest_path: Option<PathBuf>,
    pub separator: String,
}

impl Default for Naming {
    fn default() -> Self {
        Self {
            suffix: String::new(),
            dest_dir: None,
            dest_path: None,
            separator: DEFAULT_SEPARATOR.to_string(),
        }
    }
}

impl Naming {
    /// Derive an output path for `source`.
    ///
    /// `suffixes` are appended after the pair suffix (e.g. `"left"`); empty
    /// components are dropped. `extension` overrides the source's extension.
    pub fn output_path(&self, source: &Path, suffixes: &[&str], extension: Option<&str>) -> PathBuf {
        if let Some(dest) = &self.dest_path {
            return dest.clone();
        }

        let parsed = split_basename(source);
        let name = std::iter::once(parsed.stem.as_str())
            .chain(std::iter::once(self.suffix.as_str()))
            .chain(suffixes.iter().copied())
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(&self.separator);

        let file_name = match extension.or(parsed.extension.as_deref()) {
            Some(ext) => format!("{name}.{ext}"),
            None => name,
        };

        match &self.dest_dir {
            Some(dir) => dir.join(file_name),
            None => source
                .parent()
                .map(|p| p.join(&file_name))
                .unwrap_or_else(|| PathBuf::from(&file_name)),
        }
    }
}
