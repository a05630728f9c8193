//! Top-level intake entry points.
//!
//! One request flows stage by stage — sanitise, stage, resolve, build
//! options, invoke, report — synchronously to completion; there is no
//! background queue, and nothing is parallelised. Every terminal error
//! short-circuits before the conversion tool is touched, and a failure is
//! fatal only for the request: per-request staging directories keep one
//! bad upload from affecting any other.

use crate::config::IntakeConfig;
use crate::error::IntakeError;
use crate::outcome::{report, IntakeReport};
use crate::pipeline::invoke::{file_url, invoke};
use crate::pipeline::options::build_options;
use crate::pipeline::resolve::{resolve, CandidateFile};
use crate::pipeline::sanitize::sanitize;
use crate::pipeline::stage::{append_log_line, stage, StagingArea};
use crate::request::{BookMetadata, UploadRequest};
use tracing::{debug, info};

/// Run the whole intake pipeline for one upload.
///
/// This is the primary entry point for the library. The request's payload
/// file is consumed (moved into the staging directory).
///
/// # Returns
/// `Ok(IntakeReport)` whenever the conversion tool actually ran — even if
/// it exited nonzero; check `report.outcome`.
///
/// # Errors
/// `Err(IntakeError)` when the pipeline stopped before or outside the
/// tool's own verdict: bad filename, staging failure, resolution failure,
/// tool launch failure, or an overrun time bound.
pub async fn process_upload(
    request: UploadRequest,
    config: &IntakeConfig,
) -> Result<IntakeReport, IntakeError> {
    let metadata = request.metadata.clone().normalized();
    let (staging, candidate) = stage_and_resolve(request, config).await?;

    let options = build_options(candidate.kind, &metadata, &staging.root_dir, config);
    let input_url = file_url(&candidate.path)?;
    let command_line = options.command_line(&config.tool_name(), &input_url);
    debug!(%command_line, "built conversion command");

    let result = invoke(&input_url, &options, &staging, config).await?;
    let outcome = report(result.exit_code, &staging.request_id, config);

    Ok(IntakeReport {
        request_id: staging.request_id,
        staging_dir: staging.root_dir,
        log_path: staging.log_path,
        candidate,
        command_line,
        exit_code: result.exit_code,
        outcome,
    })
}

/// Stage an upload and resolve its candidate without invoking the
/// conversion tool.
///
/// Useful for previewing what a given archive would convert (the CLI's
/// `--resolve-only` mode) and as the shared front half of
/// [`process_upload`].
pub async fn stage_and_resolve(
    request: UploadRequest,
    config: &IntakeConfig,
) -> Result<(StagingArea, CandidateFile), IntakeError> {
    info!(filename = %request.raw_filename, "starting intake");

    let name = sanitize(&request.raw_filename)?;
    let staging = stage(&request.payload_path, &name, config).await?;
    let candidate = resolve(&staging.root_dir, config.max_descent)?;

    // Record the selection in the request log, like every run before us.
    let base = candidate
        .path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    append_log_line(&staging.log_path, &format!("Input file: {base}")).map_err(|e| {
        IntakeError::Staging {
            detail: format!("could not write the request log '{}'", staging.log_path.display()),
            source: e,
        }
    })?;

    Ok((staging, candidate))
}

/// Run the intake pipeline on an in-memory payload.
///
/// Spools `bytes` through a managed temp directory and hands the spooled
/// file to [`process_upload`]; the spool is cleaned up automatically once
/// staging has moved the payload out. This is the natural API for a web
/// front end that has the upload in a request body rather than on disk.
pub async fn process_upload_from_bytes(
    bytes: &[u8],
    raw_filename: &str,
    metadata: BookMetadata,
    config: &IntakeConfig,
) -> Result<IntakeReport, IntakeError> {
    let spool = tempfile::tempdir().map_err(|e| IntakeError::Staging {
        detail: "could not create a spool directory".to_string(),
        source: e,
    })?;
    let payload_path = spool.path().join("upload.bin");
    tokio::fs::write(&payload_path, bytes)
        .await
        .map_err(|e| IntakeError::Staging {
            detail: "could not spool the upload".to_string(),
            source: e,
        })?;

    let request = UploadRequest {
        raw_filename: raw_filename.to_string(),
        payload_path,
        metadata,
    };
    // `spool` is dropped (and the directory removed) when this returns.
    process_upload(request, config).await
}

/// Synchronous wrapper around [`process_upload`].
///
/// Creates a temporary tokio runtime internally, for callers without one.
pub fn process_upload_sync(
    request: UploadRequest,
    config: &IntakeConfig,
) -> Result<IntakeReport, IntakeError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| IntakeError::ConversionProcess {
            detail: "could not create a tokio runtime".to_string(),
            source: e,
        })?
        .block_on(process_upload(request, config))
}
