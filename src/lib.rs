//! # bookmill
//!
//! Upload intake and input resolution for an external ebook-conversion
//! tool.
//!
//! ## Why this crate?
//!
//! A conversion service's hard part is rarely the conversion — that is an
//! external black-box tool. The hard part is everything before it: an
//! untrusted upload that may be a lone document or an arbitrarily laid-out
//! archive, from which exactly *one* eligible source file must be chosen,
//! classified, and handed to the tool with the right flags. This crate is
//! that intake pipeline, with the selection rules (type precedence,
//! one-subdirectory-deep re-entry, ambiguity detection) made explicit and
//! testable.
//!
//! ## Pipeline Overview
//!
//! ```text
//! upload
//!  │
//!  ├─ 1. Sanitize  normalise the untrusted filename
//!  ├─ 2. Stage     per-request directory, move upload in, unpack archives
//!  ├─ 3. Resolve   pick exactly one candidate (.rst / .htm / .html / .txt)
//!  ├─ 4. Options   kind + metadata → --make/--title/--ebook/… flag set
//!  ├─ 5. Invoke    run the external tool, log to output.txt
//!  └─ 6. Report    exit code → Success(link) | Failure(message)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use bookmill::{process_upload, IntakeConfig, UploadRequest, BookMetadata};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = IntakeConfig::builder()
//!         .cache_root("/srv/www/cache")
//!         .base_url("https://books.example.org")
//!         .tool("/usr/local/bin/ebookmaker")
//!         .build()?;
//!
//!     let request = UploadRequest {
//!         raw_filename: "My Book.zip".into(),
//!         payload_path: "/tmp/spool/upload-1234".into(),
//!         metadata: BookMetadata::default(),
//!     };
//!
//!     let report = process_upload(request, &config).await?;
//!     println!("{}", report.outcome);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `bookmill` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only
//! deps:
//! ```toml
//! bookmill = { version = "0.4", default-features = false }
//! ```
//!
//! ## What stays external
//!
//! The conversion tool, the archive unpacker, and whatever front end
//! renders the upload form are collaborators, not dependencies: the first
//! two are executables named in [`IntakeConfig`], the last constructs an
//! [`UploadRequest`] however it likes. No database, no persisted state
//! beyond the per-request staging directories.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod outcome;
pub mod pipeline;
pub mod process;
pub mod request;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{IntakeConfig, IntakeConfigBuilder};
pub use error::IntakeError;
pub use outcome::{cache_link, report, IntakeReport, Outcome};
pub use pipeline::invoke::{invoke, ConversionResult};
pub use pipeline::options::{build_options, ConversionOptions, DEFAULT_EBOOK_ID};
pub use pipeline::resolve::{classify, resolve, CandidateFile, FileKind};
pub use pipeline::sanitize::sanitize;
pub use pipeline::stage::{stage, StagingArea, OUTPUT_LOG};
pub use process::{
    process_upload, process_upload_from_bytes, process_upload_sync, stage_and_resolve,
};
pub use request::{BookMetadata, UploadRequest};
