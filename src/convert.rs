//! Conversion entry points: upload → poll → download for one document.
//!
//! [`Converter`] owns the transport and configuration and runs one
//! conversion at a time. The free functions [`convert`] and [`convert_sync`]
//! build a converter for a single call.

use crate::config::ClientConfig;
use crate::error::OcrError;
use crate::format::OutputFormat;
use crate::job::JobId;
use crate::pipeline::{download, poll, upload};
use crate::transport::{HttpTransport, Transport};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// A source PDF and where its converted output should go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionRequest {
    pub source: PathBuf,
    pub destination: PathBuf,
}

impl ConversionRequest {
    pub fn new(source: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
        }
    }

    /// Output format selected by the destination's extension.
    pub fn format(&self) -> Result<OutputFormat, OcrError> {
        OutputFormat::from_destination(&self.destination)
    }
}

/// Summary of a finished conversion.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionReport {
    pub job_id: JobId,
    pub format: OutputFormat,
    /// Where the output was written (may differ from the requested destination).
    pub output_path: PathBuf,
    pub bytes_written: u64,
    /// Page count reported by the service.
    pub total_pages: u32,
    pub upload_duration_ms: u64,
    pub processing_duration_ms: u64,
    pub download_duration_ms: u64,
    pub total_duration_ms: u64,
}

/// Runs conversions against one service endpoint.
///
/// # Example
/// ```rust,no_run
/// use ocrpdf::{ClientConfig, Converter};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = ClientConfig::builder().api_key("my-app-key").build()?;
/// let converter = Converter::new(config)?;
/// let report = converter.convert("paper.pdf", "paper.mmd").await?;
/// println!("{} pages → {}", report.total_pages, report.output_path.display());
/// # Ok(())
/// # }
/// ```
pub struct Converter {
    transport: Arc<dyn Transport>,
    config: ClientConfig,
}

impl Converter {
    /// Converter talking HTTP to `config.base_url`.
    pub fn new(config: ClientConfig) -> Result<Self, OcrError> {
        let transport = HttpTransport::new(&config)?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Converter using a caller-supplied transport.
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        Self { transport, config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Convert `source` into `destination`.
    pub async fn convert(
        &self,
        source: impl AsRef<Path>,
        destination: impl AsRef<Path>,
    ) -> Result<ConversionReport, OcrError> {
        let request = ConversionRequest::new(source.as_ref(), destination.as_ref());
        self.run(&request).await
    }

    /// Run a conversion request to completion.
    ///
    /// Steps run strictly in order and any error aborts the whole call. The
    /// error is returned as produced by the failing step; a job that was
    /// already created stays on the service.
    pub async fn run(&self, request: &ConversionRequest) -> Result<ConversionReport, OcrError> {
        let total_start = Instant::now();
        let callback = self.config.progress_callback.as_deref();
        let transport = self.transport.as_ref();

        // ── Step 1: Validate destination ─────────────────────────────────
        let format = request.format()?;
        info!(
            "Converting {} → {} ({})",
            request.source.display(),
            request.destination.display(),
            format
        );

        // ── Step 2: Upload ───────────────────────────────────────────────
        if let Some(cb) = callback {
            cb.on_upload_start(&request.source);
        }
        let upload_start = Instant::now();
        let job_id = upload::upload(transport, &request.source, &self.config)
            .await
            .inspect_err(|e| warn!("Upload of {} failed: {}", request.source.display(), e))?;
        let upload_duration_ms = upload_start.elapsed().as_millis() as u64;
        if let Some(cb) = callback {
            cb.on_upload_complete(&job_id);
        }

        // ── Step 3: Poll until done ──────────────────────────────────────
        let poll_start = Instant::now();
        let policy = self.config.poll_policy();
        let job = poll::wait_for_completion(transport, &job_id, &policy, |percent| {
            if let Some(cb) = callback {
                cb.on_progress(percent);
            }
        })
        .await
        .inspect_err(|e| warn!("Waiting for job {} failed: {}", job_id, e))?;
        let processing_duration_ms = poll_start.elapsed().as_millis() as u64;

        // ── Step 4: Download ─────────────────────────────────────────────
        if let Some(cb) = callback {
            cb.on_download_start(format);
        }
        let download_start = Instant::now();
        let outcome = download::download(transport, &job_id, format, &request.destination)
            .await
            .inspect_err(|e| warn!("Download of job {} failed: {}", job_id, e))?;
        let download_duration_ms = download_start.elapsed().as_millis() as u64;

        if let Some(cb) = callback {
            cb.on_conversion_complete(&outcome.path, outcome.bytes_written);
        }

        let report = ConversionReport {
            job_id,
            format,
            output_path: outcome.path,
            bytes_written: outcome.bytes_written,
            total_pages: job.total_pages,
            upload_duration_ms,
            processing_duration_ms,
            download_duration_ms,
            total_duration_ms: total_start.elapsed().as_millis() as u64,
        };
        info!(
            "Conversion complete: job {}, {} pages, {}ms total",
            report.job_id, report.total_pages, report.total_duration_ms
        );
        Ok(report)
    }
}

/// Convert `source` into `destination` over HTTP with `config`.
pub async fn convert(
    source: impl AsRef<Path>,
    destination: impl AsRef<Path>,
    config: &ClientConfig,
) -> Result<ConversionReport, OcrError> {
    Converter::new(config.clone())?
        .convert(source, destination)
        .await
}

/// Synchronous wrapper around [`convert`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_sync(
    source: impl AsRef<Path>,
    destination: impl AsRef<Path>,
    config: &ClientConfig,
) -> Result<ConversionReport, OcrError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| OcrError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert(source, destination, config))
}
