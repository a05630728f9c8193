//! End-to-end integration tests for the intake pipeline.
//!
//! The external collaborators — conversion tool and archive unpacker —
//! are stubbed with tiny shell scripts, so the whole pipeline runs for
//! real (staging directories, request log, process invocation, exit
//! codes) without any actual converter installed. Script-based tests are
//! Unix-only.

#![cfg(unix)]

use bookmill::{
    process_upload, process_upload_from_bytes, stage_and_resolve, BookMetadata, FileKind,
    IntakeConfig, IntakeError, Outcome, UploadRequest,
};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// ── Test helpers ─────────────────────────────────────────────────────────────

fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Write an executable shell script into `dir`.
fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// A conversion-tool stub that echoes its arguments (captured in the
/// request log) and exits with `code`.
fn stub_tool(dir: &Path, code: i32) -> PathBuf {
    write_script(dir, "stub-ebookmaker", &format!("echo \"run: $@\"\nexit {code}"))
}

fn test_config(tmp: &Path, tool: &Path) -> IntakeConfig {
    IntakeConfig::builder()
        .cache_root(tmp.join("cache"))
        .base_url("https://books.example.org")
        .tool(tool)
        .unpack_tool(tmp.join("no-such-unpacker"))
        .build()
        .unwrap()
}

/// Spool a payload file the way a front end would.
fn spool(tmp: &Path, contents: &[u8]) -> PathBuf {
    let path = tmp.join("spooled-upload");
    std::fs::write(&path, contents).unwrap();
    path
}

fn request(tmp: &Path, raw_filename: &str, contents: &[u8]) -> UploadRequest {
    UploadRequest {
        raw_filename: raw_filename.to_string(),
        payload_path: spool(tmp, contents),
        metadata: BookMetadata::default(),
    }
}

// ── Full pipeline ────────────────────────────────────────────────────────────

#[tokio::test]
async fn plain_text_upload_succeeds_end_to_end() {
    init_tracing();
    let tmp = TempDir::new().unwrap();
    let config = test_config(tmp.path(), &stub_tool(tmp.path(), 0));

    let report = process_upload(request(tmp.path(), "My Book.txt", b"Once upon a time"), &config)
        .await
        .unwrap();

    assert_eq!(report.exit_code, 0);
    assert!(report.outcome.is_success());
    assert_eq!(report.candidate.kind, FileKind::Plaintext);

    // Staged under the sanitised name.
    let staged = report.staging_dir.join("My_Book.txt");
    assert_eq!(std::fs::read(&staged).unwrap(), b"Once upon a time");

    // The link points at this request's staging directory.
    match &report.outcome {
        Outcome::Success { link } => {
            assert_eq!(
                link,
                &format!("https://books.example.org/cache/{}", report.request_id)
            );
        }
        other => panic!("expected success, got {other:?}"),
    }

    // The log holds the selection record and the stub's own output.
    let log = std::fs::read_to_string(&report.log_path).unwrap();
    assert!(log.contains("Input file: My_Book.txt"), "log was: {log}");
    assert!(log.contains("run: "), "tool output must be captured: {log}");
    assert!(log.contains("--ebook=10001"), "default ebook id: {log}");

    // The command echo uses the short tool name and a file:// URL.
    assert!(report.command_line.starts_with("stub-ebookmaker "));
    assert!(report.command_line.contains("file:///"));
    assert!(report.command_line.contains("--make=epub"));
}

#[tokio::test]
async fn failing_tool_reports_failure_without_inspecting_outputs() {
    init_tracing();
    let tmp = TempDir::new().unwrap();
    let config = test_config(tmp.path(), &stub_tool(tmp.path(), 1));

    let report = process_upload(request(tmp.path(), "book.htm", b"<html></html>"), &config)
        .await
        .unwrap();

    assert_eq!(report.exit_code, 1);
    assert!(matches!(report.outcome, Outcome::Failure { .. }));
}

#[tokio::test]
async fn success_does_not_require_output_files() {
    // The stub exits 0 but writes no epub/kindle/… artifacts; the outcome
    // must still be success — the exit code is the verdict.
    init_tracing();
    let tmp = TempDir::new().unwrap();
    let config = test_config(tmp.path(), &stub_tool(tmp.path(), 0));

    let report = process_upload(request(tmp.path(), "book.rst", b"Title\n=====\n"), &config)
        .await
        .unwrap();

    assert!(report.outcome.is_success());
    assert_eq!(report.candidate.kind, FileKind::Rst);
    assert!(report.command_line.contains("--make=all"));
}

#[tokio::test]
async fn metadata_flags_reach_the_tool() {
    init_tracing();
    let tmp = TempDir::new().unwrap();
    let config = test_config(tmp.path(), &stub_tool(tmp.path(), 0));

    let meta = BookMetadata {
        title: Some("A Princess of Mars".into()),
        author: Some("Edgar Rice Burroughs".into()),
        encoding: Some("iso-8859-1".into()),
        ebook_id: Some("62".into()),
    };
    let report = process_upload_from_bytes(b"text", "story.txt", meta, &config)
        .await
        .unwrap();

    let log = std::fs::read_to_string(&report.log_path).unwrap();
    assert!(log.contains("--title=A Princess of Mars"));
    assert!(log.contains("--author=Edgar Rice Burroughs"));
    assert!(log.contains("--input-mediatype=text/plain;charset=iso-8859-1"));
    assert!(log.contains("--ebook=62"));
    assert!(!log.contains("--ebook=10001"), "user id must replace default");
}

// ── Archive flow ─────────────────────────────────────────────────────────────

/// An unpacker stub invoked as `unpack -o <archive> -d <dir>` that fakes
/// extraction by creating entries under the destination.
fn stub_unpacker(dir: &Path, body: &str) -> PathBuf {
    // $4 is the destination directory.
    write_script(dir, "stub-unzip", body)
}

#[tokio::test]
async fn archive_with_one_folder_descends_and_converts() {
    init_tracing();
    let tmp = TempDir::new().unwrap();
    let tool = stub_tool(tmp.path(), 0);
    let unpacker = stub_unpacker(
        tmp.path(),
        "mkdir -p \"$4/project/images\"\nprintf 'hello' > \"$4/project/story.txt\"",
    );
    let config = IntakeConfig::builder()
        .cache_root(tmp.path().join("cache"))
        .base_url("https://books.example.org")
        .tool(&tool)
        .unpack_tool(&unpacker)
        .build()
        .unwrap();

    let report = process_upload(
        request(tmp.path(), "project.zip", b"PK fake archive"),
        &config,
    )
    .await
    .unwrap();

    assert_eq!(report.candidate.kind, FileKind::Plaintext);
    assert!(report.candidate.path.ends_with("project/story.txt"));

    let log = std::fs::read_to_string(&report.log_path).unwrap();
    assert!(log.contains("unpacking project.zip"), "log was: {log}");
}

#[tokio::test]
async fn archive_with_two_folders_is_ambiguous() {
    init_tracing();
    let tmp = TempDir::new().unwrap();
    let tool = stub_tool(tmp.path(), 0);
    let unpacker = stub_unpacker(tmp.path(), "mkdir -p \"$4/one\" \"$4/two\"");
    let config = IntakeConfig::builder()
        .cache_root(tmp.path().join("cache"))
        .tool(&tool)
        .unpack_tool(&unpacker)
        .build()
        .unwrap();

    let err = process_upload(request(tmp.path(), "both.zip", b"PK"), &config)
        .await
        .unwrap_err();
    assert!(matches!(err, IntakeError::AmbiguousSubdirectory { .. }));
}

#[tokio::test]
async fn unreadable_archive_yields_no_eligible_file() {
    // The unpacker "fails" (extracts nothing); the archive itself is
    // skipped by extension, so resolution comes up empty.
    init_tracing();
    let tmp = TempDir::new().unwrap();
    let tool = stub_tool(tmp.path(), 0);
    let unpacker = stub_unpacker(tmp.path(), "echo 'cannot unpack' >&2\nexit 2");
    let config = IntakeConfig::builder()
        .cache_root(tmp.path().join("cache"))
        .tool(&tool)
        .unpack_tool(&unpacker)
        .build()
        .unwrap();

    let err = process_upload(request(tmp.path(), "broken.zip", b"PK"), &config)
        .await
        .unwrap_err();
    assert!(matches!(err, IntakeError::NoEligibleFile { .. }));
}

// ── Short-circuiting ─────────────────────────────────────────────────────────

#[tokio::test]
async fn resolution_failure_never_invokes_the_tool() {
    init_tracing();
    let tmp = TempDir::new().unwrap();
    // A "tool" that records it ran; it must not.
    let tool = write_script(tmp.path(), "must-not-run", "touch \"$(dirname \"$0\")/ran\"\nexit 0");
    let config = test_config(tmp.path(), &tool);

    let err = process_upload(request(tmp.path(), "notes.pdf", b"%PDF"), &config)
        .await
        .unwrap_err();
    assert!(matches!(err, IntakeError::NoEligibleFile { .. }));
    assert!(
        !tmp.path().join("ran").exists(),
        "conversion tool must not run after a resolution failure"
    );
}

#[tokio::test]
async fn empty_filename_is_invalid_input() {
    init_tracing();
    let tmp = TempDir::new().unwrap();
    let config = test_config(tmp.path(), &stub_tool(tmp.path(), 0));

    let err = process_upload(request(tmp.path(), "", b"x"), &config)
        .await
        .unwrap_err();
    assert!(matches!(err, IntakeError::InvalidInput { .. }));
}

// ── Resolve-only ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn stage_and_resolve_selects_without_converting() {
    init_tracing();
    let tmp = TempDir::new().unwrap();
    // Tool path deliberately nonexistent: resolution must not need it.
    let config = test_config(tmp.path(), &tmp.path().join("no-such-tool"));

    let (staging, candidate) =
        stage_and_resolve(request(tmp.path(), "book.html", b"<html></html>"), &config)
            .await
            .unwrap();

    assert_eq!(candidate.kind, FileKind::Html);
    let log = std::fs::read_to_string(&staging.log_path).unwrap();
    assert!(log.contains("Input file: book.html"));
}

// ── Timeout ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn overrunning_tool_is_killed() {
    init_tracing();
    let tmp = TempDir::new().unwrap();
    let tool = write_script(
        tmp.path(),
        "slow-tool",
        "if [ \"$1\" = \"--version\" ]; then echo slow-tool 1.0; exit 0; fi\nsleep 30\nexit 0",
    );
    let config = IntakeConfig::builder()
        .cache_root(tmp.path().join("cache"))
        .tool(&tool)
        .unpack_tool(tmp.path().join("no-such-unpacker"))
        .tool_timeout_secs(1)
        .build()
        .unwrap();

    let err = process_upload(request(tmp.path(), "book.txt", b"x"), &config)
        .await
        .unwrap_err();
    assert!(matches!(err, IntakeError::ToolTimeout { secs: 1 }));
}

// ── Isolation ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn concurrent_style_requests_get_distinct_directories() {
    init_tracing();
    let tmp = TempDir::new().unwrap();
    let config = test_config(tmp.path(), &stub_tool(tmp.path(), 0));

    let a = process_upload_from_bytes(b"a", "a.txt", BookMetadata::default(), &config)
        .await
        .unwrap();
    let b = process_upload_from_bytes(b"b", "b.txt", BookMetadata::default(), &config)
        .await
        .unwrap();

    assert_ne!(a.request_id, b.request_id);
    assert_ne!(a.staging_dir, b.staging_dir);
}
