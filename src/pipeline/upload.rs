//! Upload stage: stream the source PDF to the service and obtain a job id.

use crate::config::ClientConfig;
use crate::error::OcrError;
use crate::job::{JobId, UploadResponse};
use crate::pipeline::pipe;
use crate::transport::{MultipartFile, Transport};
use std::io;
use std::path::Path;
use std::time::Duration;
use tokio::io::AsyncRead;
use tracing::{debug, info, warn};

/// Endpoint receiving new PDFs.
pub const UPLOAD_ENDPOINT: &str = "pdf-file";

/// Multipart field holding the file.
pub const UPLOAD_FIELD: &str = "file";

/// How long the reader task may take to wind down once the transport has
/// returned before it is stopped.
const PRODUCER_GRACE: Duration = Duration::from_millis(500);

/// Upload `source` and return the id the service assigned to it.
///
/// The file is opened before anything touches the network, so a missing or
/// unreadable source fails without a request being made. The body is
/// produced by [`pipe::spawn_reader`] while the transport sends it.
pub async fn upload(
    transport: &dyn Transport,
    source: &Path,
    config: &ClientConfig,
) -> Result<JobId, OcrError> {
    let file = open_source(source).await?;
    upload_reader(transport, file, source, config).await
}

/// Upload the bytes of `reader` under the file name of `source`.
pub(crate) async fn upload_reader<R>(
    transport: &dyn Transport,
    reader: R,
    source: &Path,
    config: &ClientConfig,
) -> Result<JobId, OcrError>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let file_name = source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document.pdf".to_string());

    info!("Uploading {}", source.display());
    let pipe::Pipe {
        stream,
        mut producer,
    } = pipe::spawn_reader(reader, config.upload_chunk_size, config.pipe_capacity);

    let sent = transport
        .post_multipart(
            UPLOAD_ENDPOINT,
            MultipartFile {
                field_name: UPLOAD_FIELD.to_string(),
                file_name,
                content: stream,
            },
        )
        .await;

    // A service that answers before reading the whole body may leave the
    // transport holding the stream, with the reader parked on a full channel.
    let produced = match tokio::time::timeout(PRODUCER_GRACE, &mut producer).await {
        Ok(joined) => Some(
            joined.map_err(|e| OcrError::Internal(format!("Upload reader task failed: {e}")))?,
        ),
        Err(_) => {
            producer.abort();
            warn!(
                "Service answered before the upload body of {} was sent; stopped reading it",
                source.display()
            );
            None
        }
    };

    // A read failure is the root cause even when the request failed too.
    let response = match (sent, produced) {
        (_, Some(Err(e))) => {
            return Err(OcrError::FileRead {
                path: source.to_path_buf(),
                source: e,
            })
        }
        (Err(e), _) => return Err(e),
        (Ok(response), Some(Ok(bytes))) => {
            debug!("Sent {} bytes, service answered {}", bytes, response.status_text);
            response
        }
        (Ok(response), None) => response,
    };

    let parsed: UploadResponse = response
        .into_success(UPLOAD_ENDPOINT)?
        .json(UPLOAD_ENDPOINT)
        .await?;
    let job_id = parsed
        .into_job_id()
        .map_err(|detail| OcrError::protocol(UPLOAD_ENDPOINT, detail))?;

    info!("Upload accepted as job {}", job_id);
    Ok(job_id)
}

async fn open_source(path: &Path) -> Result<tokio::fs::File, OcrError> {
    let file = tokio::fs::File::open(path)
        .await
        .map_err(|e| OcrError::from_open(path.to_path_buf(), e))?;

    let metadata = file.metadata().await.map_err(|e| OcrError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    if !metadata.is_file() {
        return Err(OcrError::FileRead {
            path: path.to_path_buf(),
            source: io::Error::new(io::ErrorKind::InvalidInput, "not a regular file"),
        });
    }

    Ok(file)
}
