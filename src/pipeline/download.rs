//! Download stage: fetch a finished job's output and write it to disk.
//!
//! The body is streamed chunk by chunk into `<destination>.tmp` and renamed
//! over the destination once synced. A failed download leaves no
//! truncated output and does not touch an existing file at the destination.

use crate::error::OcrError;
use crate::format::OutputFormat;
use crate::job::JobId;
use crate::transport::{BodyStream, Transport};
use futures::StreamExt;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

/// Endpoint serving a job's output in `format`.
pub fn download_endpoint(job_id: &JobId, format: OutputFormat) -> String {
    format!("pdf/{}.{}", job_id, format.remote_extension())
}

/// Where a download ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadOutcome {
    /// Final path, after the `.tex` → `.tex.zip` correction.
    pub path: PathBuf,
    pub bytes_written: u64,
}

/// Fetch `job_id` as `format` and save it for `destination`.
///
/// See [`OutputFormat::output_path`] for how `destination` maps to the file
/// actually written.
pub async fn download(
    transport: &dyn Transport,
    job_id: &JobId,
    format: OutputFormat,
    destination: &Path,
) -> Result<DownloadOutcome, OcrError> {
    let endpoint = download_endpoint(job_id, format);
    let path = format.output_path(destination);

    info!("Downloading {} → {}", endpoint, path.display());
    let response = transport.get(&endpoint).await?.into_success(&endpoint)?;
    let bytes_written = write_atomic(response.body, &path).await?;

    info!("Wrote {} bytes to {}", bytes_written, path.display());
    Ok(DownloadOutcome {
        path,
        bytes_written,
    })
}

/// Stream `body` into `path` via a sibling `.tmp` file and rename.
///
/// The output gets the same permissions as any newly created file.
pub async fn write_atomic(body: BodyStream, path: &Path) -> Result<u64, OcrError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| write_failed(path, e))?;
    }

    let tmp_path = temp_path_for(path);
    let result = match write_body(body, &tmp_path, path).await {
        Ok(written) => {
            debug!("Renaming {} → {}", tmp_path.display(), path.display());
            tokio::fs::rename(&tmp_path, path)
                .await
                .map(|_| written)
                .map_err(|e| write_failed(path, e))
        }
        Err(e) => Err(e),
    };

    if result.is_err() {
        let _ = tokio::fs::remove_file(&tmp_path).await;
    }
    result
}

async fn write_body(mut body: BodyStream, tmp_path: &Path, path: &Path) -> Result<u64, OcrError> {
    let mut file = tokio::fs::File::create(tmp_path)
        .await
        .map_err(|e| write_failed(path, e))?;

    let mut written = 0u64;
    while let Some(chunk) = body.next().await {
        let chunk = chunk?;
        file.write_all(&chunk)
            .await
            .map_err(|e| write_failed(path, e))?;
        written += chunk.len() as u64;
    }
    file.flush().await.map_err(|e| write_failed(path, e))?;
    file.sync_all().await.map_err(|e| write_failed(path, e))?;
    Ok(written)
}

/// `out.tex.zip` → `out.tex.zip.tmp`, next to the destination.
fn temp_path_for(path: &Path) -> PathBuf {
    let mut s = path.as_os_str().to_os_string();
    s.push(".tmp");
    PathBuf::from(s)
}

fn write_failed(path: &Path, source: std::io::Error) -> OcrError {
    OcrError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    }
}
