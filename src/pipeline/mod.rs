//! Pipeline stages for upload intake.
//!
//! Each submodule implements exactly one transformation step.
//! Keeping stages separate makes each independently testable and lets us
//! swap implementations (e.g. switch the unpack utility) without touching
//! other stages.
//!
//! ## Data Flow
//!
//! ```text
//! sanitize ──▶ stage ──▶ resolve ──▶ options ──▶ invoke
//! (filename)  (dir+unpack) (pick one)  (flags)    (external tool)
//! ```
//!
//! 1. [`sanitize`] — normalise the untrusted uploaded filename to a safe
//!    on-disk name
//! 2. [`stage`]    — create the per-request staging directory, move the
//!    upload in, unpack archives via the external utility
//! 3. [`resolve`]  — walk the staged tree and select exactly one candidate
//!    input file (the only stage with non-trivial control flow)
//! 4. [`options`]  — map the candidate's kind plus user metadata onto the
//!    conversion tool's flag set
//! 5. [`invoke`]   — run the tool under a fixed locale, appending all of
//!    its output to the request log

pub mod invoke;
pub mod options;
pub mod resolve;
pub mod sanitize;
pub mod stage;
