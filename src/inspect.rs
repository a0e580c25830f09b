//! Local PDF inspection used for the pricing confirmation.
//!
//! The service bills per page, so the CLI counts pages before uploading.
//! Counting needs a pdfium library at runtime: `PDFIUM_LIB_PATH` (the
//! library file or the directory holding it) takes precedence over the
//! system library search path.

use crate::error::OcrError;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable pointing at an existing pdfium library.
pub const PDFIUM_LIB_PATH_ENV: &str = "PDFIUM_LIB_PATH";

/// Count the pages of the PDF at `path`.
///
/// Runs inside `spawn_blocking` since pdfium is a blocking C library.
pub async fn page_count(path: impl AsRef<Path>) -> Result<usize, OcrError> {
    let path = path.as_ref().to_path_buf();
    tokio::task::spawn_blocking(move || page_count_blocking(&path))
        .await
        .map_err(|e| OcrError::Internal(format!("Page count task panicked: {}", e)))?
}

fn page_count_blocking(path: &Path) -> Result<usize, OcrError> {
    if !path.exists() {
        return Err(OcrError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let pdfium = bind_pdfium()?;
    let document = pdfium
        .load_pdf_from_file(path, None)
        .map_err(|e| OcrError::PdfUnreadable {
            path: path.to_path_buf(),
            detail: format!("{:?}", e),
        })?;

    let pages = document.pages().len() as usize;
    debug!("{} has {} pages", path.display(), pages);
    Ok(pages)
}

fn bind_pdfium() -> Result<Pdfium, OcrError> {
    let bindings = match std::env::var_os(PDFIUM_LIB_PATH_ENV) {
        Some(configured) => {
            let library = library_path(PathBuf::from(configured));
            debug!("Binding pdfium from {}", library.display());
            Pdfium::bind_to_library(&library)
        }
        None => Pdfium::bind_to_system_library(),
    }
    .map_err(|e| OcrError::PdfiumBindingFailed(format!("{:?}", e)))?;

    Ok(Pdfium::new(bindings))
}

/// Accept either the library file itself or its directory.
fn library_path(configured: PathBuf) -> PathBuf {
    if configured.is_dir() {
        Pdfium::pdfium_platform_library_name_at_path(&configured)
    } else {
        configured
    }
}
