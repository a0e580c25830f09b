//! CLI binary for ocrpdf.
//!
//! A thin shim over the library crate: collects the input, output and API
//! key, confirms the price, then shows a spinner while the converter runs.

use anyhow::{bail, Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use ocrpdf::format::{is_pdf_path, suggest_destinations};
use ocrpdf::{
    estimate, page_count, ClientConfig, ConversionProgressCallback, ConversionReport, Converter,
    JobId, OutputFormat, ProgressCallback,
};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal spinner driven by conversion events.
struct SpinnerProgress {
    bar: ProgressBar,
}

impl SpinnerProgress {
    fn start() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}  {elapsed:.dim}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        bar.set_message("Uploading");
        bar.enable_steady_tick(Duration::from_millis(100));
        Arc::new(Self { bar })
    }

    fn fail(&self) {
        self.bar.abandon_with_message(red("✗ Failed"));
    }
}

impl ConversionProgressCallback for SpinnerProgress {
    fn on_upload_start(&self, source: &Path) {
        self.bar.set_message(format!("Uploading {}", source.display()));
    }

    fn on_upload_complete(&self, job_id: &JobId) {
        self.bar.set_message(format!("Queued {}", dim(job_id.as_str())));
    }

    fn on_progress(&self, percent_done: f64) {
        self.bar.set_message(format!("Processing {percent_done:.02}%"));
    }

    fn on_download_start(&self, format: OutputFormat) {
        self.bar.set_message(format!("Downloading {format}"));
    }

    fn on_conversion_complete(&self, path: &Path, _bytes: u64) {
        self.bar.finish_with_message(format!(
            "{} Saved {}",
            green("✓"),
            bold(&path.display().to_string())
        ));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Mathpix Markdown
  ocrpdf paper.pdf paper.mmd

  # Word document, skipping the price confirmation
  ocrpdf --agree paper.pdf paper.docx

  # LaTeX sources as a zip archive (saved to paper.tex.zip)
  ocrpdf paper.pdf paper.tex

  # Only show the page count and price
  ocrpdf --inspect-only paper.pdf

OUTPUT FORMATS:
  .mmd    Mathpix Markdown
  .docx   Microsoft Word
  .zip    LaTeX archive
  .tex    LaTeX archive, saved with an extra .zip suffix

PRICING:
  $0.10 per page. The page count is read locally before uploading; this
  needs a pdfium library (system path or PDFIUM_LIB_PATH).

ENVIRONMENT VARIABLES:
  MATHPIX_OCR_API_KEY     Mathpix app key
  MATHPIX_OCR_BASE_URL    Override the API endpoint
  PDFIUM_LIB_PATH         Path to libpdfium (file or directory)
"#;

/// Convert PDF files with the Mathpix OCR API.
#[derive(Parser, Debug)]
#[command(
    name = "ocrpdf",
    version,
    about = "Convert PDF files to Mathpix Markdown, DOCX or LaTeX with the Mathpix OCR API",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// PDF file to convert.
    input: PathBuf,

    /// Where to save the result (.mmd, .docx, .tex or .zip). Asked for when omitted.
    output: Option<PathBuf>,

    /// Mathpix OCR API key.
    #[arg(long, env = "MATHPIX_OCR_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Agree to pricing without confirmation.
    #[arg(long)]
    agree: bool,

    /// OCR API base URL.
    #[arg(long, env = "MATHPIX_OCR_BASE_URL", default_value = ocrpdf::DEFAULT_BASE_URL)]
    base_url: String,

    /// Delay between job status checks in milliseconds.
    #[arg(long, env = "OCRPDF_POLL_INTERVAL_MS", default_value_t = 500)]
    poll_interval_ms: u64,

    /// Give up waiting for the job after this many seconds (default: wait forever).
    #[arg(long, env = "OCRPDF_POLL_TIMEOUT")]
    poll_timeout: Option<u64>,

    /// Give up waiting for the job after this many status checks.
    #[arg(long, env = "OCRPDF_MAX_POLL_ATTEMPTS")]
    max_poll_attempts: Option<u32>,

    /// Print page count and price only, no conversion.
    #[arg(long)]
    inspect_only: bool,

    /// Disable the spinner.
    #[arg(long, env = "OCRPDF_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "OCRPDF_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "OCRPDF_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Library INFO logs would tear through the spinner line; keep them quiet
    // unless the spinner is off or --verbose is set.
    let show_progress = !cli.quiet && !cli.no_progress;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Pre-flight ───────────────────────────────────────────────────────
    if !is_pdf_path(&cli.input) {
        bail!("{} does not end with .pdf", cli.input.display());
    }
    if !cli.input.is_file() {
        bail!("{} does not exist or is not a file", cli.input.display());
    }

    let pages = match page_count(&cli.input).await {
        Ok(pages) => Some(pages),
        Err(e) if cli.agree && !cli.inspect_only => {
            warn!("Skipping page count: {e}");
            None
        }
        Err(e) => {
            return Err(e)
                .with_context(|| format!("could not parse {} as a valid pdf", cli.input.display()))
        }
    };

    if cli.inspect_only {
        let pages = pages.unwrap_or_default();
        println!("File:   {}", cli.input.display());
        println!("Pages:  {}", pages);
        println!("Price:  {}", estimate(pages));
        return Ok(());
    }

    let api_key = match cli.api_key.as_deref().map(str::trim) {
        Some(key) if !key.is_empty() => key.to_string(),
        _ => bail!("No API key: set MATHPIX_OCR_API_KEY or pass --api-key"),
    };

    let output = match cli.output.clone() {
        Some(path) => path,
        None => ask_output(&cli.input)?,
    };
    OutputFormat::from_destination(&output)?;

    if !cli.agree {
        if let Some(pages) = pages {
            let question = format!(
                "Do you agree to the cost of {} for {} pages? [y/N] ",
                estimate(pages),
                pages
            );
            if !confirm(&question)? {
                eprintln!("You must agree to pricing to continue.");
                std::process::exit(1);
            }
        }
    }

    // ── Build config ─────────────────────────────────────────────────────
    let spinner = show_progress.then(SpinnerProgress::start);
    let mut builder = ClientConfig::builder()
        .api_key(api_key)
        .base_url(cli.base_url.clone())
        .poll_interval_ms(cli.poll_interval_ms);
    if let Some(secs) = cli.poll_timeout {
        builder = builder.poll_timeout_secs(secs);
    }
    if let Some(n) = cli.max_poll_attempts {
        builder = builder.max_poll_attempts(n);
    }
    if let Some(ref s) = spinner {
        builder = builder.progress_callback(Arc::clone(s) as ProgressCallback);
    }
    let config = builder.build().context("Invalid configuration")?;
    let converter = Converter::new(config).context("Failed to create OCR client")?;

    // ── Run conversion ───────────────────────────────────────────────────
    let result = tokio::select! {
        result = converter.convert(&cli.input, &output) => result,
        _ = tokio::signal::ctrl_c() => {
            if let Some(ref s) = spinner {
                s.fail();
            }
            std::process::exit(1);
        }
    };

    let report = match result {
        Ok(report) => report,
        Err(e) => {
            if let Some(ref s) = spinner {
                s.fail();
            }
            return Err(e).context("Conversion failed");
        }
    };

    if !cli.quiet {
        print_summary(&report, show_progress);
    }
    Ok(())
}

fn print_summary(report: &ConversionReport, spinner_shown: bool) {
    if !spinner_shown {
        eprintln!(
            "{} Saved {}",
            green("✓"),
            bold(&report.output_path.display().to_string())
        );
    }
    eprintln!(
        "   {}",
        dim(&format!(
            "job {}  {} pages  {} bytes  {}ms",
            report.job_id, report.total_pages, report.bytes_written, report.total_duration_ms
        ))
    );
}

/// Ask where to save the result, offering one suggestion per format.
fn ask_output(input: &Path) -> Result<PathBuf> {
    let suggestions = suggest_destinations(input);
    eprintln!("Where would you like to save it?");
    for (i, s) in suggestions.iter().enumerate() {
        eprintln!("  {}) {}", i + 1, s.display());
    }
    let answer = prompt(&format!("Path or number [{}]: ", suggestions[0].display()))?;

    let chosen = match answer.as_str() {
        "" => suggestions[0].clone(),
        n => match n.parse::<usize>() {
            Ok(i) if (1..=suggestions.len()).contains(&i) => suggestions[i - 1].clone(),
            _ => PathBuf::from(n),
        },
    };
    if OutputFormat::from_destination(&chosen).is_err() {
        bail!(
            "{} does not end with one of: .mmd, .docx, .tex, .zip",
            chosen.display()
        );
    }
    Ok(chosen)
}

fn confirm(question: &str) -> Result<bool> {
    let answer = prompt(question)?;
    Ok(matches!(answer.to_lowercase().as_str(), "y" | "yes"))
}

fn prompt(question: &str) -> Result<String> {
    let mut stderr = io::stderr();
    stderr.write_all(question.as_bytes())?;
    stderr.flush()?;

    let mut line = String::new();
    let read = io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read answer from stdin")?;
    if read == 0 {
        bail!("stdin closed before an answer was given");
    }
    Ok(line.trim().to_string())
}
