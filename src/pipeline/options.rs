//! Option building: map a candidate's kind plus user metadata onto the
//! conversion tool's flag set.
//!
//! The historical implementation accumulated flags in a mutable string
//! across its classification branches; here the whole set is constructed in
//! one place as an immutable value, so the flag order is deterministic and
//! the exactly-one-`--ebook` invariant is enforced by construction.

use crate::config::IntakeConfig;
use crate::pipeline::resolve::FileKind;
use crate::request::BookMetadata;
use serde::Serialize;
use std::path::Path;

/// Substituted for `--ebook=` when the user supplied no identifier.
/// The tool requires one.
pub const DEFAULT_EBOOK_ID: &str = "10001";

/// An ordered, immutable set of `--flag=value` arguments for the
/// conversion tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversionOptions {
    flags: Vec<String>,
}

impl ConversionOptions {
    fn builder() -> OptionsBuilder {
        OptionsBuilder { flags: Vec::new() }
    }

    /// The flags in order, ready to pass as process arguments.
    pub fn as_args(&self) -> &[String] {
        &self.flags
    }

    /// The user-facing command echo: short tool name, flags, input URL.
    pub fn command_line(&self, tool_name: &str, input_url: &str) -> String {
        format!("{tool_name} {} {input_url}", self.flags.join(" "))
    }
}

/// Accumulates flags in order. Private to this module: the only way to get
/// a [`ConversionOptions`] is [`build_options`], which guarantees the
/// invariants.
struct OptionsBuilder {
    flags: Vec<String>,
}

impl OptionsBuilder {
    fn flag(mut self, name: &str, value: impl std::fmt::Display) -> Self {
        self.flags.push(format!("--{name}={value}"));
        self
    }

    fn make(self, target: &str) -> Self {
        self.flag("make", target)
    }

    fn build(self) -> ConversionOptions {
        ConversionOptions { flags: self.flags }
    }
}

/// Build the full option set for one conversion run.
///
/// Flag order: the kind's `--make` flags, `--max-depth`, `--output-dir`,
/// then the optional metadata flags, then `--ebook` (always present —
/// user value, or [`DEFAULT_EBOOK_ID`]).
pub fn build_options(
    kind: FileKind,
    metadata: &BookMetadata,
    output_dir: &Path,
    config: &IntakeConfig,
) -> ConversionOptions {
    let mut b = match kind {
        // RST gets the full processing chain.
        FileKind::Rst => ConversionOptions::builder().make("all"),
        FileKind::Html | FileKind::Plaintext => ConversionOptions::builder()
            .make("epub")
            .make("kindle")
            .make("txt")
            .make("html"),
    };

    b = b
        .flag("max-depth", config.max_depth)
        .flag("output-dir", output_dir.display());

    if let Some(title) = metadata.title.as_deref() {
        b = b.flag("title", title);
    }
    if let Some(author) = metadata.author.as_deref() {
        b = b.flag("author", author);
    }
    if let Some(encoding) = metadata.encoding.as_deref() {
        b = b.flag("input-mediatype", format!("text/plain;charset={encoding}"));
    }

    let ebook = metadata.ebook_id.as_deref().unwrap_or(DEFAULT_EBOOK_ID);
    b.flag("ebook", ebook).build()
}
