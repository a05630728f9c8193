//! Archive staging: give each request its own directory and unpack archives.
//!
//! ## Why a timestamp-derived directory?
//!
//! Every request stages into `{cache_root}/{request_id}` where the id is the
//! wall-clock time at millisecond resolution. The directory doubles as the
//! public result URL segment, so it must be unguessable enough not to clash
//! and readable enough to eyeball in logs; a timestamp satisfies both for
//! the operational load this service sees. A collision (two requests in the
//! same millisecond) fails the later request cleanly rather than sharing
//! the directory.

use crate::config::IntakeConfig;
use crate::error::IntakeError;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tracing::{debug, info, warn};

/// Reserved name of the per-request diagnostic log. Never a conversion
/// candidate.
pub const OUTPUT_LOG: &str = "output.txt";

/// The per-request staging directory and its log artifact.
///
/// Owned exclusively by one request; torn down only by external retention
/// policy.
#[derive(Debug, Clone, Serialize)]
pub struct StagingArea {
    /// Timestamp-derived directory name, also the public link segment.
    pub request_id: String,
    /// Absolute or config-relative path of the staging directory.
    pub root_dir: PathBuf,
    /// `{root_dir}/output.txt`.
    pub log_path: PathBuf,
}

/// True for filenames the stager treats as archives to unpack (and the
/// resolver must never select as candidates).
pub(crate) fn is_archive(name: &str) -> bool {
    name.ends_with(".zip")
}

/// Current wall-clock time as a staging request id, `YYYYMMDDhhmmss` plus
/// milliseconds.
fn request_id_now() -> String {
    chrono::Local::now().format("%Y%m%d%H%M%S%3f").to_string()
}

/// Open the request log for appending, creating it on first use.
pub(crate) fn open_log_append(path: &Path) -> std::io::Result<std::fs::File> {
    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
}

/// Append one line to the request log.
pub(crate) fn append_log_line(path: &Path, line: &str) -> std::io::Result<()> {
    let mut log = open_log_append(path)?;
    writeln!(log, "{line}")
}

/// Stage an upload: create the request directory, move the payload in under
/// its sanitised name, and unpack it if it is an archive.
///
/// The upload at `upload_path` is consumed (moved). Unpack *warnings* are
/// tolerated — a partly-unpacked tree still goes through resolution, which
/// reports its own failure if nothing eligible emerged — but a directory
/// that cannot be created or a move that fails is a
/// [`IntakeError::Staging`] error.
pub async fn stage(
    upload_path: &Path,
    sanitized_name: &str,
    config: &IntakeConfig,
) -> Result<StagingArea, IntakeError> {
    let request_id = request_id_now();
    let root_dir = config.cache_root.join(&request_id);

    tokio::fs::create_dir_all(&config.cache_root)
        .await
        .map_err(|e| IntakeError::Staging {
            detail: format!("could not create cache root '{}'", config.cache_root.display()),
            source: e,
        })?;

    // create_dir (not create_dir_all): an already-existing directory is a
    // same-instant collision and must not be shared with another request.
    tokio::fs::create_dir(&root_dir)
        .await
        .map_err(|e| IntakeError::Staging {
            detail: format!("could not create staging directory '{}'", root_dir.display()),
            source: e,
        })?;

    let staged = root_dir.join(sanitized_name);
    move_file(upload_path, &staged)
        .await
        .map_err(|e| IntakeError::Staging {
            detail: format!("could not move the upload into '{}'", staged.display()),
            source: e,
        })?;

    // World-readable so the web server can serve it back; no execute bit.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tokio::fs::set_permissions(&staged, std::fs::Permissions::from_mode(0o644))
            .await
            .map_err(|e| IntakeError::Staging {
                detail: format!("could not set permissions on '{}'", staged.display()),
                source: e,
            })?;
    }

    let log_path = root_dir.join(OUTPUT_LOG);
    info!(%request_id, file = %staged.display(), "staged upload");

    if is_archive(sanitized_name) {
        unpack(&staged, &root_dir, &log_path, config).await;
    }

    Ok(StagingArea {
        request_id,
        root_dir,
        log_path,
    })
}

/// Move a file, falling back to copy-and-delete when `rename` fails
/// (the upload spool may sit on a different filesystem).
async fn move_file(from: &Path, to: &Path) -> std::io::Result<()> {
    match tokio::fs::rename(from, to).await {
        Ok(()) => Ok(()),
        Err(_) => {
            tokio::fs::copy(from, to).await?;
            tokio::fs::remove_file(from).await
        }
    }
}

/// Unpack an archive into the staging directory via the external utility,
/// recording the attempt and the utility's own output in the request log.
///
/// Never fails the request: a missing unpacker or a nonzero exit leaves the
/// tree as-is and resolution reports whatever is (not) there.
async fn unpack(archive: &Path, dest: &Path, log_path: &Path, config: &IntakeConfig) {
    let name = archive
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    if let Err(e) = append_log_line(log_path, &format!("unpacking {name}")) {
        warn!(error = %e, "could not write to request log");
    }

    let log = match open_log_append(log_path).and_then(|f| Ok((f.try_clone()?, f))) {
        Ok(pair) => pair,
        Err(e) => {
            warn!(error = %e, "could not open request log for the unpacker");
            return;
        }
    };

    debug!(archive = %archive.display(), "running {}", config.unpack_tool.display());
    let status = tokio::process::Command::new(&config.unpack_tool)
        .arg("-o")
        .arg(archive)
        .arg("-d")
        .arg(dest)
        .stdin(Stdio::null())
        .stdout(Stdio::from(log.0))
        .stderr(Stdio::from(log.1))
        .status()
        .await;

    match status {
        Ok(s) if s.success() => {}
        Ok(s) => warn!(archive = %archive.display(), status = %s, "unpack reported warnings"),
        Err(e) => warn!(archive = %archive.display(), error = %e, "unpack could not be run"),
    }
}
