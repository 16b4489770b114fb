//! CLI output formatting.
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects. Diagnostics go through
//! `tracing` instead.
//!
//! # Output Format
//!
//! ## Process
//!
//! ```text
//! 001/002 shots/beach.jpg
//!     merge → shots/beach-stereo.jpg
//! 002/002 shots/pier.jpg
//!     merge → shots/pier-stereo.jpg (kept existing)
//!
//! 2 pairs, 1 outputs written, 1 kept, 0 failed
//! ```
//!
//! ## Check
//!
//! ```text
//! Pairs
//! 001 l.jpg + r.jpg (left/right)
//!     split → l-stereo-left.jpg, l-stereo-right.jpg
//! 002 shots/beach.jpg (side-by-side)
//!     merge → shots/beach-stereo.jpg
//!
//! Config
//!     stereopair.toml
//!     quality 85, suffix "stereo", on error abort
//! ```

use std::path::Path;

use crate::config::{OnError, StereoConfig};
use crate::interactive::format_adjustments;
use crate::process::{ProcessEvent, ProcessSummary};
use crate::render::{SaveStatus, SavedOutput};
use crate::scan::PairSource;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn saved_line(saved: &SavedOutput) -> String {
    let status = match saved.status {
        SaveStatus::Written => "",
        SaveStatus::Replaced => " (replaced)",
        SaveStatus::Skipped => " (kept existing)",
    };
    format!(
        "{}{} → {}{}",
        indent(1),
        saved.label,
        saved.path.display(),
        status
    )
}

// ============================================================================
// Process
// ============================================================================

/// Format a single process progress event as display lines.
pub fn format_process_event(event: &ProcessEvent) -> Vec<String> {
    match event {
        ProcessEvent::PairStarted {
            index,
            total,
            source,
        } => vec![format!("{}/{} {}", format_index(*index), format_index(*total), source)],
        ProcessEvent::PairSaved { outputs, .. } => outputs.iter().map(saved_line).collect(),
        ProcessEvent::PairFailed { error, .. } => {
            vec![format!("{}failed: {}", indent(1), error)]
        }
    }
}

pub fn format_process_summary(summary: &ProcessSummary) -> Vec<String> {
    vec![String::new(), summary.to_string()]
}

pub fn print_process_summary(summary: &ProcessSummary) {
    for line in format_process_summary(summary) {
        println!("{}", line);
    }
}

// ============================================================================
// Check
// ============================================================================

/// Format the pairs a `process` run would pick up, with the outputs their
/// default action would write, followed by the effective configuration.
pub fn format_check_output(
    sources: &[PairSource],
    config: &StereoConfig,
    config_file: Option<&Path>,
) -> Vec<String> {
    let naming = config.output.naming();
    let mut lines = vec!["Pairs".to_string()];

    for (i, source) in sources.iter().enumerate() {
        let kind = match source {
            PairSource::SideBySide(_) => "side-by-side",
            PairSource::Separate { .. } => "left/right",
        };
        lines.push(format!("{} {} ({})", format_index(i + 1), source.describe(), kind));

        let basename = source.basename();
        let (label, targets) = match source {
            PairSource::SideBySide(_) => ("merge", vec![naming.output_path(basename, &[], None)]),
            PairSource::Separate { .. } => (
                "split",
                vec![
                    naming.output_path(basename, &["left"], None),
                    naming.output_path(basename, &["right"], None),
                ],
            ),
        };
        let targets = targets
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", ");
        lines.push(format!("{}{} → {}", indent(1), label, targets));
    }

    lines.push(String::new());
    lines.push("Config".to_string());
    lines.push(match config_file {
        Some(path) => format!("{}{}", indent(1), path.display()),
        None => format!("{}(stock defaults)", indent(1)),
    });
    let on_error = match config.batch.on_error {
        OnError::Abort => "abort",
        OnError::Skip => "skip",
    };
    lines.push(format!(
        "{}quality {}, suffix \"{}\", on error {}",
        indent(1),
        config.output.quality,
        config.output.suffix,
        on_error
    ));
    if !config.adjust.is_identity() {
        lines.push(format!("{}adjust: {}", indent(1), format_adjustments(&config.adjust)));
    }
    lines
}

pub fn print_check_output(sources: &[PairSource], config: &StereoConfig, config_file: Option<&Path>) {
    for line in format_check_output(sources, config, config_file) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    // =========================================================================
    // Helper tests
    // =========================================================================

    #[test]
    fn format_index_pads() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(42), "042");
        assert_eq!(format_index(1000), "1000");
    }

    #[test]
    fn indent_levels() {
        assert_eq!(indent(0), "");
        assert_eq!(indent(2), "        ");
    }

    // =========================================================================
    // Process tests
    // =========================================================================

    #[test]
    fn pair_started_line() {
        let lines = format_process_event(&ProcessEvent::PairStarted {
            index: 2,
            total: 12,
            source: "shots/a.jpg".into(),
        });
        assert_eq!(lines, vec!["002/012 shots/a.jpg"]);
    }

    #[test]
    fn pair_saved_lines_show_status() {
        let lines = format_process_event(&ProcessEvent::PairSaved {
            index: 1,
            outputs: vec![
                SavedOutput {
                    path: PathBuf::from("a-stereo-left.jpg"),
                    label: "left",
                    status: SaveStatus::Written,
                },
                SavedOutput {
                    path: PathBuf::from("a-stereo-right.jpg"),
                    label: "right",
                    status: SaveStatus::Replaced,
                },
                SavedOutput {
                    path: PathBuf::from("a-stereo.gif"),
                    label: "animation",
                    status: SaveStatus::Skipped,
                },
            ],
        });
        assert_eq!(
            lines,
            vec![
                "    left → a-stereo-left.jpg",
                "    right → a-stereo-right.jpg (replaced)",
                "    animation → a-stereo.gif (kept existing)",
            ]
        );
    }

    #[test]
    fn pair_failed_line() {
        let lines = format_process_event(&ProcessEvent::PairFailed {
            index: 1,
            source: "a.jpg".into(),
            error: "boom".into(),
        });
        assert_eq!(lines, vec!["    failed: boom"]);
    }

    #[test]
    fn summary_follows_blank_line() {
        let summary = ProcessSummary {
            pairs: 2,
            failed: 1,
            written: 3,
            skipped: 0,
        };
        assert_eq!(
            format_process_summary(&summary),
            vec!["", "2 pairs, 3 outputs written, 0 kept, 1 failed"]
        );
    }

    // =========================================================================
    // Check tests
    // =========================================================================

    #[test]
    fn check_lists_pairs_with_default_outputs() {
        let sources = vec![
            PairSource::Separate {
                left: PathBuf::from("l.jpg"),
                right: PathBuf::from("r.jpg"),
            },
            PairSource::SideBySide(PathBuf::from("shots/beach.jpg")),
        ];
        let lines = format_check_output(&sources, &StereoConfig::default(), None);
        assert_eq!(
            lines,
            vec![
                "Pairs",
                "001 l.jpg + r.jpg (left/right)",
                "    split → l-stereo-left.jpg, l-stereo-right.jpg",
                "002 shots/beach.jpg (side-by-side)",
                "    merge → shots/beach-stereo.jpg",
                "",
                "Config",
                "    (stock defaults)",
                "    quality 85, suffix \"stereo\", on error abort",
            ]
        );
    }

    #[test]
    fn check_shows_config_file_and_adjustments() {
        let mut config = StereoConfig::default();
        config.adjust.rotate = 1.5;
        config.batch.on_error = OnError::Skip;
        let sources = vec![PairSource::SideBySide(PathBuf::from("a.png"))];

        let lines = format_check_output(&sources, &config, Some(Path::new("stereopair.toml")));
        assert!(lines.contains(&"    stereopair.toml".to_string()));
        assert!(lines.iter().any(|l| l.ends_with("on error skip")));
        assert!(
            lines
                .iter()
                .any(|l| l.starts_with("    adjust: ") && l.contains("rotate=1.50"))
        );
    }
}
