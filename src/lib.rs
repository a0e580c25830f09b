//! # ocrpdf
//!
//! Convert PDF documents to Mathpix Markdown, DOCX or zipped LaTeX through
//! the Mathpix OCR API.
//!
//! ## Workflow
//!
//! ```text
//! source.pdf
//!  │
//!  ├─ 1. Validate  destination extension → output format
//!  ├─ 2. Upload    multipart POST pdf-file, streamed from a reader task
//!  ├─ 3. Poll      GET pdf/{id} every 500 ms until 100 %
//!  └─ 4. Download  GET pdf/{id}.{mmd|docx|tex} → atomically written file
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ocrpdf::{convert, ClientConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig::builder()
//!         .api_key(std::env::var("MATHPIX_OCR_API_KEY")?)
//!         .build()?;
//!     let report = convert("paper.pdf", "paper.tex", &config).await?;
//!     // LaTeX output is a zip archive: written to paper.tex.zip
//!     eprintln!("saved {}", report.output_path.display());
//!     Ok(())
//! }
//! ```
//!
//! ## Output formats
//!
//! | Destination | Requested as | Saved as |
//! |-------------|--------------|----------|
//! | `out.mmd`   | `mmd`        | `out.mmd` |
//! | `out.docx`  | `docx`       | `out.docx` |
//! | `out.zip`   | `tex`        | `out.zip` |
//! | `out.tex`   | `tex`        | `out.tex.zip` |
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `ocrpdf` binary (clap + anyhow + indicatif + tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod format;
pub mod inspect;
pub mod job;
pub mod pipeline;
pub mod pricing;
pub mod progress;
pub mod transport;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ClientConfig, ClientConfigBuilder, PollPolicy, DEFAULT_BASE_URL};
pub use convert::{convert, convert_sync, ConversionReport, ConversionRequest, Converter};
pub use error::{ErrorKind, OcrError};
pub use format::OutputFormat;
pub use inspect::page_count;
pub use job::{Job, JobId};
pub use pricing::{estimate, PriceEstimate};
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
pub use transport::{HttpResponse, HttpTransport, MultipartFile, Transport};
