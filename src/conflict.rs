//! What to do when an output path already exists.
//!
//! A [`ConflictResolver`] is consulted right before each output is written.
//! It is either a fixed policy ([`ConflictResolver::always`]) or asks a
//! [`ConflictPrompt`] on the first conflict and keeps asking until the
//! operator answers "replace all" or "skip all", which sticks for the rest of
//! the run.
//!
//! | Decision | Effect |
//! |---|---|
//! | `Replace` | existing file is deleted, the output is written |
//! | `Ignore` | the write is skipped, the file is left untouched |
//! | `Abort` | [`ConflictError::AlreadyExists`], nothing is written |

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConflictError {
    #[error("{0} already exists")]
    AlreadyExists(PathBuf),
    #[error("Could not remove existing {path}: {source}")]
    Remove { path: PathBuf, source: io::Error },
    #[error("Conflict prompt failed: {0}")]
    Prompt(io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Replace,
    Abort,
    Ignore,
}

/// An operator's answer to a single conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    Replace,
    Abort,
    Skip,
    ReplaceAll,
    SkipAll,
}

impl Choice {
    fn decision(self) -> Decision {
        match self {
            Choice::Replace | Choice::ReplaceAll => Decision::Replace,
            Choice::Skip | Choice::SkipAll => Decision::Ignore,
            Choice::Abort => Decision::Abort,
        }
    }

    fn is_sticky(self) -> bool {
        matches!(self, Choice::ReplaceAll | Choice::SkipAll)
    }
}

/// Source of answers for the interactive resolver.
pub trait ConflictPrompt {
    fn ask(&mut self, path: &Path) -> io::Result<Choice>;
}

/// Outcome of resolving one output path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Nothing was in the way.
    Write,
    /// An existing file was removed; write in its place.
    Replaced,
    /// Leave the existing file alone.
    Skip,
}

enum Mode {
    Always(Decision),
    Ask {
        prompt: Box<dyn ConflictPrompt>,
        memo: Option<Decision>,
    },
}

pub struct ConflictResolver {
    mode: Mode,
}

impl ConflictResolver {
    /// Fixed policy that never asks.
    pub fn always(decision: Decision) -> Self {
        Self {
            mode: Mode::Always(decision),
        }
    }

    /// Ask `prompt` on conflicts until a sticky answer is given.
    pub fn interactive(prompt: Box<dyn ConflictPrompt>) -> Self {
        Self {
            mode: Mode::Ask { prompt, memo: None },
        }
    }

    /// Decision for an existing `path`, prompting if needed.
    pub fn decide(&mut self, path: &Path) -> Result<Decision, ConflictError> {
        match &mut self.mode {
            Mode::Always(decision) => Ok(*decision),
            Mode::Ask {
                memo: Some(decision),
                ..
            } => Ok(*decision),
            Mode::Ask { prompt, memo } => {
                let choice = prompt.ask(path).map_err(ConflictError::Prompt)?;
                if choice.is_sticky() {
                    *memo = Some(choice.decision());
                }
                Ok(choice.decision())
            }
        }
    }

    /// Clear the way for writing `path`.
    pub fn resolve(&mut self, path: &Path) -> Result<Resolution, ConflictError> {
        if !path.exists() {
            return Ok(Resolution::Write);
        }
        match self.decide(path)? {
            Decision::Replace => {
                std::fs::remove_file(path).map_err(|source| ConflictError::Remove {
                    path: path.to_path_buf(),
                    source,
                })?;
                Ok(Resolution::Replaced)
            }
            Decision::Ignore => Ok(Resolution::Skip),
            Decision::Abort => Err(ConflictError::AlreadyExists(path.to_path_buf())),
        }
    }
}

/// Line-oriented prompt, normally over stdin/stderr.
///
/// Accepts `r` (replace), `a` (abort), `s` (skip), `R` (replace all) and
/// `S` (skip all). End of input aborts.
pub struct LinePrompt<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> LinePrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl LinePrompt<io::BufReader<io::Stdin>, io::Stderr> {
    /// Prompt on stderr, answers from stdin. Reads byte by byte so other
    /// stdin readers in the process see every line not consumed here.
    pub fn stdio() -> Self {
        Self::new(io::BufReader::with_capacity(1, io::stdin()), io::stderr())
    }
}

fn parse_choice(answer: &str) -> Option<Choice> {
    match answer.trim() {
        "r" | "replace" => Some(Choice::Replace),
        "a" | "abort" => Some(Choice::Abort),
        "s" | "skip" => Some(Choice::Skip),
        "R" | "replace-all" => Some(Choice::ReplaceAll),
        "S" | "skip-all" => Some(Choice::SkipAll),
        _ => None,
    }
}

impl<R: BufRead, W: Write> ConflictPrompt for LinePrompt<R, W> {
    fn ask(&mut self, path: &Path) -> io::Result<Choice> {
        loop {
            write!(
                self.output,
                "{} exists. [r]eplace, [a]bort, [s]kip, [R]eplace all, [S]kip all? ",
                path.display()
            )?;
            self.output.flush()?;

            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                return Ok(Choice::Abort);
            }
            if let Some(choice) = parse_choice(&line) {
                return Ok(choice);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;
    use tempfile::TempDir;

    /// Prompt that replays scripted answers and counts how often it was asked.
    struct Scripted {
        answers: Vec<Choice>,
        asked: Rc<RefCell<usize>>,
    }

    impl ConflictPrompt for Scripted {
        fn ask(&mut self, _path: &Path) -> io::Result<Choice> {
            *self.asked.borrow_mut() += 1;
            Ok(self.answers.remove(0))
        }
    }

    fn scripted(answers: &[Choice]) -> (ConflictResolver, Rc<RefCell<usize>>) {
        let asked = Rc::new(RefCell::new(0));
        let prompt = Scripted {
            answers: answers.to_vec(),
            asked: Rc::clone(&asked),
        };
        (ConflictResolver::interactive(Box::new(prompt)), asked)
    }

    fn existing_file(tmp: &TempDir, name: &str) -> PathBuf {
        let path = tmp.path().join(name);
        std::fs::write(&path, b"old").unwrap();
        path
    }

    #[test]
    fn missing_path_needs_no_decision() {
        let tmp = TempDir::new().unwrap();
        let mut resolver = ConflictResolver::always(Decision::Abort);
        let result = resolver.resolve(&tmp.path().join("new.png")).unwrap();
        assert_eq!(result, Resolution::Write);
    }

    #[test]
    fn always_replace_deletes_existing() {
        let tmp = TempDir::new().unwrap();
        let path = existing_file(&tmp, "a.png");
        let mut resolver = ConflictResolver::always(Decision::Replace);
        assert_eq!(resolver.resolve(&path).unwrap(), Resolution::Replaced);
        assert!(!path.exists());
    }

    #[test]
    fn always_ignore_leaves_file_untouched() {
        let tmp = TempDir::new().unwrap();
        let path = existing_file(&tmp, "a.png");
        let mut resolver = ConflictResolver::always(Decision::Ignore);
        assert_eq!(resolver.resolve(&path).unwrap(), Resolution::Skip);
        assert_eq!(std::fs::read(&path).unwrap(), b"old");
    }

    #[test]
    fn always_abort_errors() {
        let tmp = TempDir::new().unwrap();
        let path = existing_file(&tmp, "a.png");
        let mut resolver = ConflictResolver::always(Decision::Abort);
        let result = resolver.resolve(&path);
        assert!(matches!(result, Err(ConflictError::AlreadyExists(p)) if p == path));
        assert!(path.exists());
    }

    #[test]
    fn interactive_asks_every_time_without_sticky_answer() {
        let tmp = TempDir::new().unwrap();
        let a = existing_file(&tmp, "a.png");
        let b = existing_file(&tmp, "b.png");
        let (mut resolver, asked) = scripted(&[Choice::Skip, Choice::Replace]);

        assert_eq!(resolver.resolve(&a).unwrap(), Resolution::Skip);
        assert_eq!(resolver.resolve(&b).unwrap(), Resolution::Replaced);
        assert_eq!(*asked.borrow(), 2);
    }

    #[test]
    fn replace_all_is_remembered() {
        let tmp = TempDir::new().unwrap();
        let a = existing_file(&tmp, "a.png");
        let b = existing_file(&tmp, "b.png");
        let c = existing_file(&tmp, "c.png");
        let (mut resolver, asked) = scripted(&[Choice::ReplaceAll]);

        for path in [&a, &b, &c] {
            assert_eq!(resolver.resolve(path).unwrap(), Resolution::Replaced);
        }
        assert_eq!(*asked.borrow(), 1);
    }

    #[test]
    fn skip_all_is_remembered() {
        let tmp = TempDir::new().unwrap();
        let a = existing_file(&tmp, "a.png");
        let b = existing_file(&tmp, "b.png");
        let (mut resolver, asked) = scripted(&[Choice::SkipAll]);

        assert_eq!(resolver.resolve(&a).unwrap(), Resolution::Skip);
        assert_eq!(resolver.resolve(&b).unwrap(), Resolution::Skip);
        assert_eq!(*asked.borrow(), 1);
        assert!(a.exists() && b.exists());
    }

    #[test]
    fn line_prompt_reasks_on_garbage() {
        let input = io::Cursor::new(b"what\nR\n".to_vec());
        let mut out = Vec::new();
        let mut prompt = LinePrompt::new(input, &mut out);
        assert_eq!(prompt.ask(Path::new("x.png")).unwrap(), Choice::ReplaceAll);
        let shown = String::from_utf8(out).unwrap();
        assert_eq!(shown.matches("x.png exists").count(), 2);
    }

    #[test]
    fn line_prompt_eof_aborts() {
        let mut prompt = LinePrompt::new(io::Cursor::new(Vec::new()), io::sink());
        assert_eq!(prompt.ask(Path::new("x.png")).unwrap(), Choice::Abort);
    }

    #[test]
    fn parse_choice_variants() {
        assert_eq!(parse_choice("s\n"), Some(Choice::Skip));
        assert_eq!(parse_choice("S"), Some(Choice::SkipAll));
        assert_eq!(parse_choice(" abort "), Some(Choice::Abort));
        assert_eq!(parse_choice("x"), None);
    }
}
