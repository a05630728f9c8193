//! CLI binary for bookmill.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `IntakeConfig` + `UploadRequest` and prints the outcome. It spools the
//! input file through a temp directory first, so the file you point it at
//! is never moved or modified.

use anyhow::{Context, Result};
use bookmill::{process_upload, stage_and_resolve, BookMetadata, IntakeConfig, UploadRequest};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert a single document
  bookmill book.rst

  # Convert an archive (one top-level folder, images in images/)
  bookmill project.zip --title "A Princess of Mars" --author "Edgar Rice Burroughs"

  # Plain text needs an input encoding
  bookmill story.txt --encoding iso-8859-1 --ebook 62

  # See which file inside the archive would be converted, without converting
  bookmill project.zip --resolve-only

  # Structured output for scripting
  bookmill book.htm --json

INPUT SELECTION:
  Exactly one file is converted per run, whichever is found first among
  .rst .htm .html .txt — so archives should normally contain one source
  document. One top-level folder is followed; two are an error. File type
  is decided by file NAME, so names should be lower case with no spaces.

  rst    full processing chain (all output formats)
  html   most output formats, including EPUB
  txt    a few output formats; expect some tool errors without --encoding

ENVIRONMENT VARIABLES:
  BOOKMILL_TOOL         Conversion tool command (default: ebookmaker)
  BOOKMILL_UNPACK_TOOL  Archive unpacker command (default: unzip)
  BOOKMILL_CACHE_ROOT   Staging/output root (default: cache)
  BOOKMILL_BASE_URL     Public base URL for result links
"#;

/// Stage an upload, pick its source document, and run the conversion tool.
#[derive(Parser, Debug)]
#[command(
    name = "bookmill",
    version,
    about = "Stage an upload, pick its source document, and run the conversion tool",
    long_about = "Stage a document or archive the way the upload service would: \
sanitise the filename, unpack archives, select exactly one source file \
(.rst/.htm/.html/.txt), and run the external conversion tool against it, \
capturing all diagnostics in the request's output.txt.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Document or archive to submit.
    input: PathBuf,

    /// Ebook title, forwarded as --title.
    #[arg(long, env = "BOOKMILL_TITLE")]
    title: Option<String>,

    /// Ebook author, forwarded as --author.
    #[arg(long, env = "BOOKMILL_AUTHOR")]
    author: Option<String>,

    /// Input character encoding (us-ascii, iso-8859-1, utf-8, …);
    /// expected for plain-text inputs.
    #[arg(long, env = "BOOKMILL_ENCODING")]
    encoding: Option<String>,

    /// Ebook number, forwarded as --ebook. A fixed placeholder is used
    /// when omitted.
    #[arg(long, env = "BOOKMILL_EBOOK")]
    ebook: Option<String>,

    /// Staging/output root directory.
    #[arg(long, env = "BOOKMILL_CACHE_ROOT", default_value = "cache")]
    cache_root: PathBuf,

    /// Public base URL for result links.
    #[arg(long, env = "BOOKMILL_BASE_URL", default_value = "http://localhost:8000")]
    base_url: String,

    /// Conversion tool command.
    #[arg(long, env = "BOOKMILL_TOOL", default_value = "ebookmaker")]
    tool: PathBuf,

    /// Archive unpacker command.
    #[arg(long, env = "BOOKMILL_UNPACK_TOOL", default_value = "unzip")]
    unpack_tool: PathBuf,

    /// --max-depth value passed to the conversion tool.
    #[arg(long, env = "BOOKMILL_MAX_DEPTH", default_value_t = 3)]
    max_depth: u32,

    /// Bound on nested single-subdirectory descent during resolution.
    #[arg(long, env = "BOOKMILL_MAX_DESCENT", default_value_t = 32)]
    max_descent: usize,

    /// Kill the conversion tool after this many seconds (default: no bound).
    #[arg(long, env = "BOOKMILL_TOOL_TIMEOUT")]
    tool_timeout: Option<u64>,

    /// Stage and resolve only; print the selected file without converting.
    #[arg(long)]
    resolve_only: bool,

    /// Output the full report as JSON instead of prose.
    #[arg(long, env = "BOOKMILL_JSON")]
    json: bool,

    /// Disable the progress spinner.
    #[arg(long, env = "BOOKMILL_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "BOOKMILL_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors and the outcome.
    #[arg(short, long, env = "BOOKMILL_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Library logs go to stderr; the spinner and outcome own stdout.
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = build_config(&cli).context("Invalid configuration")?;

    // ── Spool the input ──────────────────────────────────────────────────
    // Staging *moves* its payload; copy into a spool first so the user's
    // file survives, mirroring how a web front end spools request bodies.
    let raw_filename = cli
        .input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let spool = tempfile::tempdir().context("Failed to create a spool directory")?;
    let payload_path = spool.path().join("upload.bin");
    tokio::fs::copy(&cli.input, &payload_path)
        .await
        .with_context(|| format!("Failed to read '{}'", cli.input.display()))?;

    let request = UploadRequest {
        raw_filename,
        payload_path,
        metadata: BookMetadata {
            title: cli.title.clone(),
            author: cli.author.clone(),
            encoding: cli.encoding.clone(),
            ebook_id: cli.ebook.clone(),
        },
    };

    // ── Resolve-only mode ────────────────────────────────────────────────
    if cli.resolve_only {
        let (staging, candidate) = stage_and_resolve(request, &config)
            .await
            .context("Intake failed")?;

        if cli.json {
            println!("{}", serde_json::to_string_pretty(&candidate)?);
        } else {
            println!(
                "{} {} ({})",
                green("✔"),
                bold(&candidate.path.display().to_string()),
                candidate.kind
            );
            println!("   {}", dim(&format!("staged in {}", staging.root_dir.display())));
        }
        return Ok(());
    }

    // ── Run the pipeline ─────────────────────────────────────────────────
    let spinner = if !cli.quiet && !cli.json && !cli.no_progress {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_message(format!("Converting with {}…", config.tool_name()));
        bar.enable_steady_tick(Duration::from_millis(80));
        Some(bar)
    } else {
        None
    };

    let result = process_upload(request, &config).await;

    if let Some(bar) = spinner {
        bar.finish_and_clear();
    }

    let report = result.context("Intake failed")?;

    // ── Print the outcome ────────────────────────────────────────────────
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        let tick = if report.outcome.is_success() {
            green("✔")
        } else {
            red("✘")
        };
        println!("{tick} {}", report.outcome);
        if !cli.quiet {
            println!("   {}", dim(&report.command_line));
            println!(
                "   {}",
                dim(&format!("log: {}", report.log_path.display()))
            );
        }
    }

    if !report.outcome.is_success() {
        std::process::exit(1);
    }
    Ok(())
}

/// Map CLI args to `IntakeConfig`.
fn build_config(cli: &Cli) -> Result<IntakeConfig> {
    let mut builder = IntakeConfig::builder()
        .cache_root(&cli.cache_root)
        .base_url(&cli.base_url)
        .tool(&cli.tool)
        .unpack_tool(&cli.unpack_tool)
        .max_depth(cli.max_depth)
        .max_descent(cli.max_descent);

    if let Some(secs) = cli.tool_timeout {
        builder = builder.tool_timeout_secs(secs);
    }

    Ok(builder.build()?)
}
