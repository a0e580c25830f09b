//! Job records exchanged with the OCR service.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier the service assigns to an uploaded PDF.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Body of a `POST pdf-file` answered with status 200.
///
/// The service also answers rejected uploads (bad key, unsupported file)
/// with 200 and an `error` field instead of `pdf_id`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UploadResponse {
    #[serde(default)]
    pub pdf_id: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl UploadResponse {
    /// The assigned job id, or a description of why there is none.
    pub fn into_job_id(self) -> Result<JobId, String> {
        match (self.pdf_id, self.error) {
            (Some(id), _) if !id.trim().is_empty() => Ok(JobId(id)),
            (_, Some(error)) => Err(format!("service rejected the upload: {error}")),
            (Some(_), None) => Err("empty pdf_id".to_string()),
            (None, None) => Err("missing pdf_id".to_string()),
        }
    }
}

/// Status of an OCR job as reported by `GET pdf/{id}`.
///
/// Numeric fields the service has not filled in yet (it omits the page
/// counts until the PDF is loaded) default to zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    #[serde(default)]
    pub status: String,
    #[serde(default, rename = "num_pages")]
    pub total_pages: u32,
    #[serde(default, rename = "num_pages_completed")]
    pub completed_pages: u32,
    #[serde(default)]
    pub percent_done: f64,
}

impl Job {
    /// The service reports exactly 100 once the output can be downloaded.
    pub fn is_complete(&self) -> bool {
        self.percent_done >= 100.0
    }

    /// The service marks jobs it could not process with status `error`.
    pub fn is_failed(&self) -> bool {
        self.status.eq_ignore_ascii_case("error")
    }
}
