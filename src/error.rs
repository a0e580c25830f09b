//! Error types for the ocrpdf library.
//!
//! Every failure in the upload → poll → download workflow is fatal: there is
//! no retry and no partial result, so a single [`OcrError`] enum covers the
//! whole crate. Variants are grouped into coarse classes via
//! [`OcrError::kind`] so callers (and tests) can match on *what went wrong*
//! without caring about the exact variant:
//!
//! | Kind         | Raised when |
//! |--------------|-------------|
//! | `Validation` | destination extension unsupported, bad configuration |
//! | `File`       | source cannot be opened/read, output cannot be written |
//! | `Transport`  | connection refused, DNS failure, timeout, broken body |
//! | `Remote`     | service answered with a non-200 status, or failed the job |
//! | `Protocol`   | response body is not the JSON shape we expect |
//! | `Timeout`    | the poll policy's time or attempt bound was reached |
//! | `Pdf`        | local page counting failed |

use std::path::PathBuf;
use thiserror::Error;

/// Boxed cause kept behind transport failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// All errors returned by the ocrpdf library.
#[derive(Debug, Error)]
pub enum OcrError {
    // ── Validation errors ─────────────────────────────────────────────────
    /// Destination does not end in one of the supported extensions.
    #[error("'{path}' does not end with one of: .mmd, .docx, .tex, .zip")]
    UnsupportedDestination { path: PathBuf },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── File errors ───────────────────────────────────────────────────────
    /// Source file was not found at the given path.
    #[error("File not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the source file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// Source could be opened but reading it failed.
    #[error("Failed to read '{path}': {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not create or write the downloaded output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Network errors ────────────────────────────────────────────────────
    /// The request never produced an HTTP response, or its body broke off.
    #[error("Request to '{endpoint}' failed: {source}\nCheck your internet connection.")]
    Transport {
        endpoint: String,
        #[source]
        source: BoxError,
    },

    /// The service answered with a status other than 200.
    #[error("'{endpoint}' returned {status_text}")]
    Remote {
        endpoint: String,
        status: u16,
        status_text: String,
    },

    /// The service reported the job itself as failed.
    #[error("OCR job '{job_id}' failed on the service (status: {status})")]
    JobFailed { job_id: String, status: String },

    /// Response body did not have the expected JSON shape.
    #[error("Unexpected response from '{endpoint}': {detail}")]
    Protocol { endpoint: String, detail: String },

    /// Polling gave up before the job reached 100 %.
    #[error("OCR job '{job_id}' still at {percent_done:.02}% after {attempts} status checks ({elapsed_ms}ms)")]
    PollTimeout {
        job_id: String,
        attempts: u32,
        elapsed_ms: u64,
        percent_done: f64,
    },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// pdfium could not open the document for page counting.
    #[error("Could not parse '{path}' as a valid pdf: {detail}")]
    PdfUnreadable { path: PathBuf, detail: String },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\
Set PDFIUM_LIB_PATH to the directory holding libpdfium, or pass --agree to skip page counting."
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse classification of an [`OcrError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    File,
    Transport,
    Remote,
    Protocol,
    Timeout,
    Pdf,
    Internal,
}

impl OcrError {
    /// Which class of failure this is.
    pub fn kind(&self) -> ErrorKind {
        match self {
            OcrError::UnsupportedDestination { .. } | OcrError::InvalidConfig(_) => {
                ErrorKind::Validation
            }
            OcrError::FileNotFound { .. }
            | OcrError::PermissionDenied { .. }
            | OcrError::FileRead { .. }
            | OcrError::OutputWriteFailed { .. } => ErrorKind::File,
            OcrError::Transport { .. } => ErrorKind::Transport,
            OcrError::Remote { .. } | OcrError::JobFailed { .. } => ErrorKind::Remote,
            OcrError::Protocol { .. } => ErrorKind::Protocol,
            OcrError::PollTimeout { .. } => ErrorKind::Timeout,
            OcrError::PdfUnreadable { .. } | OcrError::PdfiumBindingFailed(_) => ErrorKind::Pdf,
            OcrError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Map an `open()` failure on the source file to the matching variant.
    pub(crate) fn from_open(path: PathBuf, err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => OcrError::FileNotFound { path },
            std::io::ErrorKind::PermissionDenied => OcrError::PermissionDenied { path },
            _ => OcrError::FileRead { path, source: err },
        }
    }

    pub(crate) fn protocol(endpoint: &str, detail: impl std::fmt::Display) -> Self {
        OcrError::Protocol {
            endpoint: endpoint.to_string(),
            detail: detail.to_string(),
        }
    }

    pub(crate) fn transport(endpoint: &str, source: impl Into<BoxError>) -> Self {
        OcrError::Transport {
            endpoint: endpoint.to_string(),
            source: source.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_display_carries_status_text() {
        let e = OcrError::Remote {
            endpoint: "pdf-file".into(),
            status: 401,
            status_text: "401 Unauthorized".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("401 Unauthorized"), "got: {msg}");
        assert!(msg.contains("pdf-file"), "got: {msg}");
        assert_eq!(e.kind(), ErrorKind::Remote);
    }

    #[test]
    fn open_errors_are_classified_as_file() {
        let path = PathBuf::from("missing.pdf");
        let nf = OcrError::from_open(
            path.clone(),
            std::io::Error::from(std::io::ErrorKind::NotFound),
        );
        assert!(matches!(nf, OcrError::FileNotFound { .. }));

        let pd = OcrError::from_open(
            path.clone(),
            std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        );
        assert!(matches!(pd, OcrError::PermissionDenied { .. }));

        let other = OcrError::from_open(path, std::io::Error::other("disk on fire"));
        assert!(matches!(other, OcrError::FileRead { .. }));
        assert_eq!(other.kind(), ErrorKind::File);
    }

    #[test]
    fn transport_error_keeps_source() {
        use std::error::Error;
        let e = OcrError::transport("pdf/abc", std::io::Error::other("connection refused"));
        assert_eq!(e.kind(), ErrorKind::Transport);
        let source = e.source().expect("source is preserved");
        assert!(source.to_string().contains("connection refused"));
    }

    #[test]
    fn poll_timeout_display() {
        let e = OcrError::PollTimeout {
            job_id: "2024_01_01_abc".into(),
            attempts: 12,
            elapsed_ms: 6000,
            percent_done: 41.5,
        };
        let msg = e.to_string();
        assert!(msg.contains("41.50%"), "got: {msg}");
        assert!(msg.contains("12 status checks"), "got: {msg}");
        assert_eq!(e.kind(), ErrorKind::Timeout);
    }

    #[test]
    fn unsupported_destination_is_validation() {
        let e = OcrError::UnsupportedDestination {
            path: PathBuf::from("out.txt"),
        };
        assert_eq!(e.kind(), ErrorKind::Validation);
        assert!(e.to_string().contains(".docx"));
    }
}
