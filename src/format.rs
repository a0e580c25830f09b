//! Output formats and destination-path handling.
//!
//! The destination's extension selects what the service is asked for:
//!
//! | Extension | Format                       | Requested as | Written to          |
//! |-----------|------------------------------|--------------|---------------------|
//! | `.mmd`    | [`OutputFormat::Mmd`]        | `mmd`        | destination         |
//! | `.docx`   | [`OutputFormat::Docx`]       | `docx`       | destination         |
//! | `.zip`    | [`OutputFormat::TexArchive`] | `tex`        | destination         |
//! | `.tex`    | [`OutputFormat::TexArchive`] | `tex`        | destination + `.zip`|
//!
//! The service always answers a `tex` request with a zip archive, so a
//! `.tex` destination gets a `.zip` suffix appended.

use crate::error::OcrError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Destination extensions accepted by [`OutputFormat::from_destination`].
pub const SUPPORTED_EXTENSIONS: [&str; 4] = ["mmd", "docx", "tex", "zip"];

/// Output format requested from the OCR service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// Mathpix Markdown.
    Mmd,
    /// Microsoft Word document.
    Docx,
    /// Zipped LaTeX sources with extracted images.
    TexArchive,
}

impl OutputFormat {
    /// Select the format from the destination's extension.
    ///
    /// The extension is whatever follows the last `.` of the file name, so a
    /// bare `.mmd` counts. Matching is exact: `out.MMD` is rejected just like
    /// `out.txt`.
    pub fn from_destination(path: &Path) -> Result<Self, OcrError> {
        match destination_extension(path) {
            Some("mmd") => Ok(OutputFormat::Mmd),
            Some("docx") => Ok(OutputFormat::Docx),
            Some("tex") | Some("zip") => Ok(OutputFormat::TexArchive),
            _ => Err(OcrError::UnsupportedDestination {
                path: path.to_path_buf(),
            }),
        }
    }

    /// The format string used in `pdf/{id}.{format}`.
    pub fn remote_extension(self) -> &'static str {
        match self {
            OutputFormat::Mmd => "mmd",
            OutputFormat::Docx => "docx",
            OutputFormat::TexArchive => "tex",
        }
    }

    /// Where the downloaded bytes for `destination` end up on disk.
    pub fn output_path(self, destination: &Path) -> PathBuf {
        let is_tex = destination_extension(destination) == Some("tex");
        if self == OutputFormat::TexArchive && is_tex {
            let mut s = destination.as_os_str().to_os_string();
            s.push(".zip");
            PathBuf::from(s)
        } else {
            destination.to_path_buf()
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Mmd => f.write_str("Mathpix Markdown"),
            OutputFormat::Docx => f.write_str("DOCX"),
            OutputFormat::TexArchive => f.write_str("LaTeX archive"),
        }
    }
}

/// Text after the last `.` of the file name, dotfiles included.
fn destination_extension(path: &Path) -> Option<&str> {
    let name = path.file_name()?.to_str()?;
    name.rsplit_once('.').map(|(_, ext)| ext)
}

/// Candidate destinations for an input PDF, one per output format.
///
/// `paper.pdf` → `paper.mmd`, `paper.docx`, `paper.tex.zip`.
pub fn suggest_destinations(input: &Path) -> Vec<PathBuf> {
    let stem = match input.extension().and_then(|e| e.to_str()) {
        Some("pdf") => input.with_extension(""),
        _ => input.to_path_buf(),
    };
    ["mmd", "docx", "tex.zip"]
        .iter()
        .map(|ext| {
            let mut s = stem.as_os_str().to_os_string();
            s.push(".");
            s.push(ext);
            PathBuf::from(s)
        })
        .collect()
}

/// Whether `path` names a PDF (by extension).
pub fn is_pdf_path(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("pdf")
}
