//! Input resolution: select exactly one candidate file from the staged tree.
//!
//! ## The selection rules
//!
//! A staged upload is either a single document or an unpacked archive whose
//! layout we do not control. Resolution scans one directory level at a time:
//!
//! * The first file (in scan order) whose extension is recognised wins, and
//!   scanning stops immediately — first hit, not best hit.
//! * One subdirectory per level is tolerated and remembered; it is only
//!   descended into after every file at the current level has been ruled
//!   out. Two sibling subdirectories are ambiguous and fail the request.
//! * The request log and archive files are never candidates.
//!
//! Chains of single subdirectories therefore descend one level at a time,
//! bounded by the caller-supplied `max_descent`.
//!
//! Entries are sorted by file name before scanning. The historical tool
//! took whatever order the filesystem enumeration produced, which made
//! "first found" platform-dependent; sorting keeps the same first-match
//! semantics while making the winner reproducible.

use crate::error::IntakeError;
use crate::pipeline::stage::{is_archive, OUTPUT_LOG};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Classification of a candidate file by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    /// ReStructured Text — the only kind with the full processing chain.
    Rst,
    /// HTML source (`.htm` or `.html`).
    Html,
    /// Plain text. The conversion tool expects an input encoding for these.
    Plaintext,
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FileKind::Rst => "rst",
            FileKind::Html => "html",
            FileKind::Plaintext => "plaintext",
        })
    }
}

/// The single input file selected for conversion.
#[derive(Debug, Clone, Serialize)]
pub struct CandidateFile {
    pub path: PathBuf,
    pub kind: FileKind,
}

/// Classify a file name by extension, in the fixed precedence order
/// `.rst`, `.htm`, `.html`, `.txt`. Case-sensitive, matching the
/// historical tool — `BOOK.TXT` is not eligible.
pub fn classify(file_name: &str) -> Option<FileKind> {
    const TABLE: &[(&str, FileKind)] = &[
        (".rst", FileKind::Rst),
        (".htm", FileKind::Html),
        (".html", FileKind::Html),
        (".txt", FileKind::Plaintext),
    ];
    TABLE
        .iter()
        .find(|(ext, _)| file_name.ends_with(ext))
        .map(|(_, kind)| *kind)
}

/// What one directory level yielded.
enum LevelScan {
    /// An eligible file; scanning stopped at it.
    Found(CandidateFile),
    /// No eligible file, but exactly one subdirectory to try next.
    Descend(PathBuf),
    /// No eligible file and nowhere further to look.
    Exhausted,
}

/// Scan a single directory level.
fn scan_level(dir: &Path) -> Result<LevelScan, IntakeError> {
    let read = std::fs::read_dir(dir).map_err(|e| IntakeError::Staging {
        detail: format!("could not open staging directory '{}'", dir.display()),
        source: e,
    })?;

    let mut entries: Vec<_> = read
        .collect::<Result<_, _>>()
        .map_err(|e| IntakeError::Staging {
            detail: format!("could not list staging directory '{}'", dir.display()),
            source: e,
        })?;
    entries.sort_by_key(|e| e.file_name());

    let mut pending_subdir: Option<PathBuf> = None;

    for entry in entries {
        let path = entry.path();
        let name = entry.file_name().to_string_lossy().into_owned();

        if path.is_dir() {
            if pending_subdir.is_some() {
                return Err(IntakeError::AmbiguousSubdirectory {
                    dir: dir.to_path_buf(),
                });
            }
            // Remember it, but keep checking the rest of this level first.
            pending_subdir = Some(path);
            continue;
        }

        if name == OUTPUT_LOG || is_archive(&name) {
            continue;
        }

        if let Some(kind) = classify(&name) {
            // First hit wins; a pending subdirectory is discarded.
            return Ok(LevelScan::Found(CandidateFile { path, kind }));
        }
    }

    Ok(match pending_subdir {
        Some(next) => LevelScan::Descend(next),
        None => LevelScan::Exhausted,
    })
}

/// Walk the staged tree from `root` and select exactly one candidate.
///
/// # Errors
/// * [`IntakeError::AmbiguousSubdirectory`] — two sibling directories at
///   one level.
/// * [`IntakeError::NoEligibleFile`] — the reachable tree holds nothing
///   with a recognised extension.
/// * [`IntakeError::DepthLimitExceeded`] — more than `max_descent` nested
///   single-subdirectory levels.
pub fn resolve(root: &Path, max_descent: usize) -> Result<CandidateFile, IntakeError> {
    let mut dir = root.to_path_buf();

    // Level 0 is the root itself; each Descend consumes one unit of budget.
    for _ in 0..=max_descent {
        match scan_level(&dir)? {
            LevelScan::Found(candidate) => {
                debug!(path = %candidate.path.display(), kind = %candidate.kind, "resolved input");
                return Ok(candidate);
            }
            LevelScan::Descend(next) => {
                debug!(into = %next.display(), "no file at this level, descending");
                dir = next;
            }
            LevelScan::Exhausted => {
                return Err(IntakeError::NoEligibleFile {
                    dir: root.to_path_buf(),
                })
            }
        }
    }

    Err(IntakeError::DepthLimitExceeded { limit: max_descent })
}
