//! Progress-callback trait for conversion events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::ClientConfigBuilder::progress_callback`] to receive
//! events as the converter uploads, polls and downloads.
//!
//! The library never renders anything itself; the `ocrpdf` binary turns
//! these events into a terminal spinner.
//!
//! # Example
//!
//! ```rust
//! use ocrpdf::{ClientConfig, ConversionProgressCallback};
//! use std::sync::Arc;
//!
//! struct LogProgress;
//!
//! impl ConversionProgressCallback for LogProgress {
//!     fn on_progress(&self, percent_done: f64) {
//!         eprintln!("processing {percent_done:.02}%");
//!     }
//! }
//!
//! let config = ClientConfig::builder()
//!     .api_key("my-app-key")
//!     .progress_callback(Arc::new(LogProgress))
//!     .build()
//!     .unwrap();
//! ```

use crate::format::OutputFormat;
use crate::job::JobId;
use std::path::Path;
use std::sync::Arc;

/// Called by the converter at each step of a conversion.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Events arrive strictly in order: one upload start,
/// one upload complete, one or more `on_progress`, one download start, one
/// conversion complete.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called before the source file is opened for upload.
    fn on_upload_start(&self, source: &Path) {
        let _ = source;
    }

    /// Called once the service has accepted the upload.
    fn on_upload_complete(&self, job_id: &JobId) {
        let _ = job_id;
    }

    /// Called after every status check with the job's `percent_done`.
    fn on_progress(&self, percent_done: f64) {
        let _ = percent_done;
    }

    /// Called when the job is complete and the download begins.
    fn on_download_start(&self, format: OutputFormat) {
        let _ = format;
    }

    /// Called after the output file has been fully written.
    ///
    /// # Arguments
    /// * `path`  — final location, including any `.zip` suffix correction
    /// * `bytes` — size of the written file
    fn on_conversion_complete(&self, path: &Path, bytes: u64) {
        let _ = (path, bytes);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ClientConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;
