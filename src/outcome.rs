//! Result reporting: turn an exit status into a user-facing outcome.
//!
//! The reporter is pure string construction. In particular it never
//! inspects the filesystem to second-guess the exit code: a tool that
//! exited zero without producing every requested format is still a
//! "success" here, and the request log is where the uploader finds out
//! what really happened.

use crate::config::IntakeConfig;
use crate::pipeline::resolve::CandidateFile;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// User-facing verdict for one intake request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Outcome {
    /// The tool terminated normally. `link` points at the request's public
    /// output directory.
    Success { link: String },
    /// The tool ended with an error code.
    Failure { message: String },
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success { .. })
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Success { link } => write!(
                f,
                "Success: the conversion tool ended with a successful exit \
                 code. This does not mean all desired output was generated; \
                 the output.txt file in the result directory has the detail. \
                 Your input and any output files are at: {link}"
            ),
            Outcome::Failure { message } => write!(f, "{message}"),
        }
    }
}

/// The public link for a request's output directory.
pub fn cache_link(base_url: &str, request_id: &str) -> String {
    format!("{}/cache/{}", base_url.trim_end_matches('/'), request_id)
}

/// Map an exit code to an [`Outcome`].
pub fn report(exit_code: i32, request_id: &str, config: &IntakeConfig) -> Outcome {
    if exit_code == 0 {
        Outcome::Success {
            link: cache_link(&config.base_url, request_id),
        }
    } else {
        Outcome::Failure {
            message: format!(
                "Sorry, the conversion tool ended with an error code \
                 ({exit_code}). Please try again, or send email if this \
                 seems to be an actual problem rather than a temporary \
                 glitch or a problem with your file."
            ),
        }
    }
}

/// Everything one intake run produced, for callers and the CLI's `--json`
/// output.
#[derive(Debug, Clone, Serialize)]
pub struct IntakeReport {
    /// Timestamp-derived staging id, also the public link segment.
    pub request_id: String,
    /// The staging directory holding input, log, and outputs.
    pub staging_dir: PathBuf,
    /// The diagnostic log (`output.txt`).
    pub log_path: PathBuf,
    /// The one file selected for conversion.
    pub candidate: CandidateFile,
    /// The command echo shown to the uploader (short tool name, never the
    /// full path).
    pub command_line: String,
    /// The tool's exit code, verbatim.
    pub exit_code: i32,
    /// The user-facing verdict.
    pub outcome: Outcome,
}
