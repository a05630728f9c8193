//! The per-request input types.
//!
//! An [`UploadRequest`] is whatever the hosting front end hands us: the
//! browser-supplied filename (untrusted), a path to the spooled payload on
//! local disk, and the optional metadata fields from the form. It is created
//! once per request and never mutated after sanitisation.

use std::path::PathBuf;

/// One uploaded file plus its user-supplied metadata.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    /// The filename as submitted, before any sanitisation. May contain
    /// path separators, spaces, or anything else a browser lets through.
    pub raw_filename: String,

    /// Where the payload currently sits on disk. Staging *moves* this file
    /// into the request's staging directory, so the path must be
    /// relinquishable (a spool or temp location, never a file the caller
    /// wants to keep).
    pub payload_path: PathBuf,

    /// Optional metadata forwarded to the conversion tool.
    pub metadata: BookMetadata,
}

/// User-supplied conversion metadata. Every field is optional; empty
/// strings are treated as absent.
#[derive(Debug, Clone, Default)]
pub struct BookMetadata {
    /// Ebook title, forwarded as `--title=`.
    pub title: Option<String>,
    /// Ebook author, forwarded as `--author=`.
    pub author: Option<String>,
    /// Input character encoding, forwarded as
    /// `--input-mediatype=text/plain;charset=…`. Expected for plain-text
    /// uploads; its absence there produces downstream tool errors, which
    /// are reported rather than prevented.
    pub encoding: Option<String>,
    /// Ebook identifier, forwarded as `--ebook=`. A fixed placeholder is
    /// substituted when absent.
    pub ebook_id: Option<String>,
}

impl BookMetadata {
    /// Map empty or whitespace-only fields to `None`, so the option builder
    /// only ever sees values worth forwarding.
    pub fn normalized(self) -> Self {
        fn clean(v: Option<String>) -> Option<String> {
            v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
        }
        Self {
            title: clean(self.title),
            author: clean(self.author),
            encoding: clean(self.encoding),
            ebook_id: clean(self.ebook_id),
        }
    }
}
