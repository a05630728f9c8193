//! Conversion invocation: run the external tool and capture its verdict.
//!
//! ## The process contract
//!
//! The tool is a black box invoked as `{tool} {flags...} file://{path}`.
//! Everything it prints — stdout and stderr alike — is appended to the
//! request's `output.txt` so the uploader can read it later; nothing is
//! surfaced inline beyond the exit code. The environment is pinned to the
//! `C.UTF-8` locale so text-encoding behaviour does not vary with whatever
//! locale the host service happens to run under.
//!
//! A zero exit code means only that the tool terminated normally; it does
//! NOT guarantee every requested output format was produced. The log is
//! the source of truth for what actually happened.

use crate::config::IntakeConfig;
use crate::error::IntakeError;
use crate::pipeline::options::ConversionOptions;
use crate::pipeline::stage::{open_log_append, StagingArea};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tracing::{info, warn};

/// Locale pinned into the tool's environment.
const LOCALE: &str = "C.UTF-8";

/// The verdict of one conversion run.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionResult {
    /// The tool's exit code, verbatim. `-1` when the process died to a
    /// signal.
    pub exit_code: i32,
    /// The request log the tool's output was appended to.
    pub log_path: PathBuf,
    /// The staging directory the tool wrote its artifacts into.
    pub output_dir: PathBuf,
}

/// Build the `file://` URL for a candidate, from its absolute path.
pub fn file_url(path: &Path) -> Result<String, IntakeError> {
    let abs = std::fs::canonicalize(path).map_err(|e| IntakeError::ConversionProcess {
        detail: format!("could not resolve input path '{}'", path.display()),
        source: e,
    })?;
    Ok(format!("file://{}", abs.display()))
}

/// Run the conversion tool against `input_url` with the built options.
///
/// Blocks (awaits) for the tool's full runtime — potentially minutes for
/// large inputs — unless `tool_timeout_secs` is configured, in which case
/// an overrunning tool is killed and [`IntakeError::ToolTimeout`] is
/// returned. Launch failure and log-write failure are
/// [`IntakeError::ConversionProcess`]; a nonzero exit is *not* an error
/// and comes back inside the [`ConversionResult`].
pub async fn invoke(
    input_url: &str,
    options: &ConversionOptions,
    staging: &StagingArea,
    config: &IntakeConfig,
) -> Result<ConversionResult, IntakeError> {
    record_tool_version(config, &staging.log_path).await;

    let log = open_log_append(&staging.log_path).map_err(|e| IntakeError::ConversionProcess {
        detail: format!("could not open the request log '{}'", staging.log_path.display()),
        source: e,
    })?;
    let log_err = log.try_clone().map_err(|e| IntakeError::ConversionProcess {
        detail: "could not duplicate the request log handle".to_string(),
        source: e,
    })?;

    info!(tool = %config.tool.display(), input = input_url, "starting conversion");

    let mut child = tokio::process::Command::new(&config.tool)
        .args(options.as_args())
        .arg(input_url)
        .env("LC_ALL", LOCALE)
        .env("LANG", LOCALE)
        .stdin(Stdio::null())
        .stdout(Stdio::from(log))
        .stderr(Stdio::from(log_err))
        .spawn()
        .map_err(|e| IntakeError::ConversionProcess {
            detail: format!("could not launch '{}'", config.tool.display()),
            source: e,
        })?;

    let status = match config.tool_timeout_secs {
        None => child.wait().await,
        Some(secs) => match tokio::time::timeout(Duration::from_secs(secs), child.wait()).await {
            Ok(status) => status,
            Err(_) => {
                warn!(secs, "conversion tool overran its time bound, killing it");
                let _ = child.kill().await;
                return Err(IntakeError::ToolTimeout { secs });
            }
        },
    }
    .map_err(|e| IntakeError::ConversionProcess {
        detail: format!("could not wait on '{}'", config.tool.display()),
        source: e,
    })?;

    let exit_code = status.code().unwrap_or(-1);
    info!(exit_code, "conversion finished");

    Ok(ConversionResult {
        exit_code,
        log_path: staging.log_path.clone(),
        output_dir: staging.root_dir.clone(),
    })
}

/// Record the tool's `--version` banner at the top of the request log, so
/// every log states which tool build produced it.
///
/// Best-effort: a tool that cannot report its version will fail properly
/// on the conversion run, with a better error.
async fn record_tool_version(config: &IntakeConfig, log_path: &Path) {
    let files = open_log_append(log_path).and_then(|f| Ok((f.try_clone()?, f)));
    let (out, err) = match files {
        Ok(pair) => pair,
        Err(e) => {
            warn!(error = %e, "could not open the request log for the version banner");
            return;
        }
    };

    let status = tokio::process::Command::new(&config.tool)
        .arg("--version")
        .stdin(Stdio::null())
        .stdout(Stdio::from(out))
        .stderr(Stdio::from(err))
        .status()
        .await;

    if let Err(e) = status {
        warn!(error = %e, tool = %config.tool.display(), "could not record tool version");
    }
}
