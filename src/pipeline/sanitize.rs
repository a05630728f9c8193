//! Filename sanitisation: normalise an untrusted uploaded filename.
//!
//! The sanitised name is used verbatim as an on-disk filename inside the
//! staging directory and later appears inside a `file://` URL handed to an
//! external process, so it must survive both without quoting. Anything
//! outside a conservative character class becomes `_`; path components are
//! stripped first so a name like `../../etc/passwd` stages as `passwd`.

use crate::error::IntakeError;
use once_cell::sync::Lazy;
use regex::Regex;

static RE_UNSAFE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9._-]").unwrap());

/// Reduce a browser-supplied filename to a safe on-disk name.
///
/// Pure and idempotent: `sanitize(sanitize(x)) == sanitize(x)` whenever the
/// first call succeeds. Degenerate inputs — empty, or names that reduce to
/// nothing but dots and underscores — fail with
/// [`IntakeError::InvalidInput`].
pub fn sanitize(raw_name: &str) -> Result<String, IntakeError> {
    // Browsers may send either separator; keep only the final segment.
    let base = raw_name.rsplit(['/', '\\']).next().unwrap_or("");
    let name = RE_UNSAFE.replace_all(base, "_").into_owned();

    if name.is_empty() || name.chars().all(|c| c == '.' || c == '_') {
        return Err(IntakeError::InvalidInput {
            name: raw_name.to_string(),
        });
    }

    Ok(name)
}
