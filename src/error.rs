//! Error types for the bookmill library.
//!
//! One enum covers the whole intake pipeline. Every variant renders as a
//! plain-language message suitable for showing to the person who uploaded
//! the file — the web front end and the CLI both surface these texts
//! directly, so no variant leaks a raw system error on its own.
//!
//! A *nonzero exit code from the conversion tool is not an error*: the tool
//! ran to completion and reported its own verdict, which flows through
//! [`crate::pipeline::invoke::ConversionResult`] into
//! [`crate::outcome::Outcome::Failure`]. [`IntakeError::ConversionProcess`]
//! is reserved for the tool not running at all.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the intake pipeline.
#[derive(Debug, Error)]
pub enum IntakeError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// No file was received, or the filename reduces to nothing safe.
    #[error(
        "No usable file was received: '{name}' is empty or contains no \
         usable characters.\nPlease upload again with a simpler filename."
    )]
    InvalidInput { name: String },

    // ── Staging errors ────────────────────────────────────────────────────
    /// The staging directory could not be created, or the upload could not
    /// be moved into it.
    #[error("A problem occurred preparing the upload area: {detail}.\nPlease try again, or report this if it persists.")]
    Staging {
        detail: String,
        #[source]
        source: std::io::Error,
    },

    // ── Resolution errors ─────────────────────────────────────────────────
    /// The staged tree contains two or more sibling top-level directories.
    #[error(
        "More than one top-level directory was included in the archive.\n\
         Please include only one top-level subdirectory or folder."
    )]
    AmbiguousSubdirectory { dir: PathBuf },

    /// Nothing ending in rst, txt, htm, or html was found anywhere reachable.
    #[error(
        "Could not identify a file ending in rst, txt, htm, or html under '{dir}'.\n\
         You might need to give a more Unix-friendly filename (no spaces, \
         lower case, no special characters)."
    )]
    NoEligibleFile { dir: PathBuf },

    /// A chain of single subdirectories ran deeper than the configured bound.
    #[error(
        "Gave up after descending {limit} nested subdirectories without \
         finding an eligible file.\nPlease flatten the archive layout."
    )]
    DepthLimitExceeded { limit: usize },

    // ── Conversion errors ─────────────────────────────────────────────────
    /// The external tool could not be launched, or its log could not be
    /// written. Distinct from the tool running and exiting nonzero.
    #[error("The conversion tool could not be run: {detail}")]
    ConversionProcess {
        detail: String,
        #[source]
        source: std::io::Error,
    },

    /// The configured runtime bound elapsed and the tool was terminated.
    #[error(
        "The conversion tool was still running after {secs}s and was \
         terminated.\nLarge inputs may need a higher --tool-timeout."
    )]
    ToolTimeout { secs: u64 },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_input_display() {
        let e = IntakeError::InvalidInput {
            name: "???".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("???"), "got: {msg}");
        assert!(msg.contains("upload again"));
    }

    #[test]
    fn ambiguous_subdirectory_display() {
        let e = IntakeError::AmbiguousSubdirectory {
            dir: PathBuf::from("/tmp/x"),
        };
        assert!(e.to_string().contains("More than one top-level directory"));
    }

    #[test]
    fn no_eligible_file_display() {
        let e = IntakeError::NoEligibleFile {
            dir: PathBuf::from("/srv/cache/20110925120000000"),
        };
        let msg = e.to_string();
        assert!(msg.contains("rst, txt, htm, or html"));
        assert!(msg.contains("20110925120000000"));
    }

    #[test]
    fn depth_limit_display() {
        let e = IntakeError::DepthLimitExceeded { limit: 32 };
        assert!(e.to_string().contains("32"));
    }

    #[test]
    fn tool_timeout_display() {
        let e = IntakeError::ToolTimeout { secs: 600 };
        assert!(e.to_string().contains("600s"));
    }
}
