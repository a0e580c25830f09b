//! Authenticated HTTP access to the OCR service.
//!
//! [`Transport`] is the seam between the workflow and the network: the
//! upload, poll and download stages only ever talk to a `dyn Transport`, so
//! tests can script responses without a server and the real client
//! ([`HttpTransport`]) stays a thin layer over `reqwest`.
//!
//! A transport returns raw status codes. Turning a non-200 into an error is
//! the caller's job via [`HttpResponse::into_success`], which keeps status
//! handling identical no matter which transport is plugged in.

use crate::config::ClientConfig;
use crate::error::OcrError;
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, BoxStream, Stream, StreamExt, TryStreamExt};
use serde::de::DeserializeOwned;
use std::fmt;
use std::pin::Pin;
use std::time::Duration;
use tracing::debug;

/// Header carrying the Mathpix API key.
pub const API_KEY_HEADER: &str = "app_key";

/// Chunks of a file being uploaded.
pub type UploadStream = Pin<Box<dyn Stream<Item = std::io::Result<Bytes>> + Send + Sync>>;

/// Chunks of a response body.
pub type BodyStream = BoxStream<'static, Result<Bytes, OcrError>>;

/// A single file sent as one part of a `multipart/form-data` body.
pub struct MultipartFile {
    pub field_name: String,
    pub file_name: String,
    pub content: UploadStream,
}

/// Status line and streaming body of a response.
pub struct HttpResponse {
    pub status: u16,
    /// Status code and reason phrase, e.g. `401 Unauthorized`.
    pub status_text: String,
    pub body: BodyStream,
}

impl fmt::Debug for HttpResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpResponse")
            .field("status", &self.status)
            .field("status_text", &self.status_text)
            .finish_non_exhaustive()
    }
}

impl HttpResponse {
    pub fn new(status: u16, body: BodyStream) -> Self {
        Self {
            status,
            status_text: status_text(status),
            body,
        }
    }

    /// A response whose body is already in memory.
    pub fn from_bytes(status: u16, body: impl Into<Bytes>) -> Self {
        let body: Bytes = body.into();
        Self::new(status, stream::once(async move { Ok::<_, OcrError>(body) }).boxed())
    }

    pub fn is_success(&self) -> bool {
        self.status == 200
    }

    /// Fail with [`OcrError::Remote`] unless the status is 200.
    pub fn into_success(self, endpoint: &str) -> Result<Self, OcrError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(OcrError::Remote {
                endpoint: endpoint.to_string(),
                status: self.status,
                status_text: self.status_text,
            })
        }
    }

    /// Collect the whole body. Only meant for small JSON responses.
    pub async fn bytes(self) -> Result<Bytes, OcrError> {
        let chunks: Vec<Bytes> = self.body.try_collect().await?;
        Ok(chunks.concat().into())
    }

    /// Collect and decode a JSON body.
    pub async fn json<T: DeserializeOwned>(self, endpoint: &str) -> Result<T, OcrError> {
        let body = self.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| OcrError::protocol(endpoint, e))
    }
}

fn status_text(status: u16) -> String {
    match reqwest::StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
    {
        Some(reason) => format!("{status} {reason}"),
        None => status.to_string(),
    }
}

/// Issues requests against the service base URL.
///
/// `path` is always relative to the base URL (`pdf-file`, `pdf/{id}`).
/// Implementations must attach the API key to every request.
#[async_trait]
pub trait Transport: Send + Sync {
    /// `GET {base}/{path}`.
    async fn get(&self, path: &str) -> Result<HttpResponse, OcrError>;

    /// `POST {base}/{path}` with `file` as the only form part.
    ///
    /// The content must be consumed as a stream, never collected up front.
    async fn post_multipart(&self, path: &str, file: MultipartFile)
        -> Result<HttpResponse, OcrError>;
}

/// [`Transport`] backed by a pooled `reqwest::Client`.
pub struct HttpTransport {
    client: reqwest::Client,
    config: ClientConfig,
}

impl HttpTransport {
    /// Build a transport for `config.base_url` authenticated with `config.api_key`.
    pub fn new(config: &ClientConfig) -> Result<Self, OcrError> {
        if config.api_key.trim().is_empty() {
            return Err(OcrError::InvalidConfig(
                "an API key is required (set MATHPIX_OCR_API_KEY or pass --api-key)".into(),
            ));
        }
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .user_agent(concat!("ocrpdf/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| OcrError::Internal(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    async fn send(
        &self,
        path: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<HttpResponse, OcrError> {
        let response = request
            .header(API_KEY_HEADER, &self.config.api_key)
            .send()
            .await
            .map_err(|e| OcrError::transport(path, e))?;

        let status = response.status().as_u16();
        debug!("{} → {}", path, status);

        let endpoint = path.to_string();
        let body = response
            .bytes_stream()
            .map_err(move |e| OcrError::transport(&endpoint, e))
            .boxed();

        Ok(HttpResponse::new(status, body))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, path: &str) -> Result<HttpResponse, OcrError> {
        let url = self.config.endpoint_url(path);
        debug!("GET {}", url);
        self.send(path, self.client.get(url)).await
    }

    async fn post_multipart(
        &self,
        path: &str,
        file: MultipartFile,
    ) -> Result<HttpResponse, OcrError> {
        let url = self.config.endpoint_url(path);
        debug!("POST {} (multipart field '{}')", url, file.field_name);

        let part = reqwest::multipart::Part::stream(reqwest::Body::wrap_stream(file.content))
            .file_name(file.file_name)
            .mime_str("application/octet-stream")
            .map_err(|e| OcrError::Internal(format!("Invalid multipart mime type: {e}")))?;
        let form = reqwest::multipart::Form::new().part(file.field_name, part);

        self.send(path, self.client.post(url).multipart(form)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Accept one connection, capture the raw request, answer 200 with `reply`.
    async fn serve_once(reply: &'static str) -> (String, tokio::task::JoinHandle<Vec<u8>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}/v3", listener.local_addr().unwrap());

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
                if request_complete(&request) {
                    break;
                }
            }
            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                reply.len(),
                reply
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            request
        });

        (base_url, server)
    }

    fn request_complete(request: &[u8]) -> bool {
        let text = String::from_utf8_lossy(request).to_lowercase();
        let Some(head_end) = text.find("\r\n\r\n") else {
            return false;
        };
        if text[..head_end].contains("transfer-encoding: chunked") {
            return text.ends_with("0\r\n\r\n");
        }
        let length = text[..head_end]
            .lines()
            .find_map(|l| l.strip_prefix("content-length:"))
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(0);
        request.len() >= head_end + 4 + length
    }

    fn transport_for(base_url: String) -> HttpTransport {
        let config = ClientConfig::builder()
            .api_key("test-key")
            .base_url(base_url)
            .build()
            .unwrap();
        HttpTransport::new(&config).unwrap()
    }

    #[tokio::test]
    async fn get_sends_key_to_joined_url() {
        let (base_url, server) = serve_once(r#"{"id":"abc"}"#).await;
        let transport = transport_for(base_url);

        let response = transport.get("pdf/abc").await.unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(&response.bytes().await.unwrap()[..], br#"{"id":"abc"}"#);

        let request = String::from_utf8(server.await.unwrap()).unwrap();
        assert!(request.starts_with("GET /v3/pdf/abc HTTP/1.1\r\n"), "got: {request}");
        assert!(
            request.to_lowercase().contains("\r\napp_key: test-key\r\n"),
            "got: {request}"
        );
    }

    #[tokio::test]
    async fn post_multipart_sends_key_and_file_part() {
        let (base_url, server) = serve_once(r#"{"pdf_id":"abc"}"#).await;
        let transport = transport_for(base_url);

        let chunks = vec![Ok::<_, std::io::Error>(Bytes::from_static(b"%PDF-1.4 hello"))];
        let content: UploadStream = Box::pin(stream::iter(chunks));
        let response = transport
            .post_multipart(
                "pdf-file",
                MultipartFile {
                    field_name: "file".into(),
                    file_name: "paper.pdf".into(),
                    content,
                },
            )
            .await
            .unwrap();
        assert_eq!(response.status, 200);

        let request = String::from_utf8_lossy(&server.await.unwrap()).into_owned();
        let lower = request.to_lowercase();
        assert!(request.starts_with("POST /v3/pdf-file HTTP/1.1\r\n"), "got: {request}");
        assert!(lower.contains("\r\napp_key: test-key\r\n"), "got: {request}");
        assert!(lower.contains("content-type: multipart/form-data; boundary="));
        assert!(
            request.contains(r#"Content-Disposition: form-data; name="file"; filename="paper.pdf""#),
            "got: {request}"
        );
        assert!(request.contains("%PDF-1.4 hello"), "got: {request}");
    }

    #[tokio::test]
    async fn non_200_becomes_remote_error() {
        let resp = HttpResponse::from_bytes(401, "unauthorized");
        let err = resp.into_success("pdf-file").unwrap_err();
        match err {
            OcrError::Remote {
                endpoint,
                status,
                status_text,
            } => {
                assert_eq!(endpoint, "pdf-file");
                assert_eq!(status, 401);
                assert_eq!(status_text, "401 Unauthorized");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn other_2xx_is_still_an_error() {
        let resp = HttpResponse::from_bytes(204, Bytes::new());
        assert!(resp.into_success("pdf/abc").is_err());
    }

    #[tokio::test]
    async fn body_chunks_are_concatenated() {
        let chunks = vec![Ok(Bytes::from_static(b"{\"pdf_")), Ok(Bytes::from_static(b"id\":\"x\"}"))];
        let resp = HttpResponse::new(200, stream::iter(chunks).boxed());
        let v: serde_json::Value = resp.json("pdf-file").await.unwrap();
        assert_eq!(v["pdf_id"], "x");
    }

    #[tokio::test]
    async fn bad_json_is_protocol_error() {
        let resp = HttpResponse::from_bytes(200, "<html>oops</html>");
        let err = resp.json::<serde_json::Value>("pdf-file").await.unwrap_err();
        assert!(matches!(err, OcrError::Protocol { .. }), "{err:?}");
    }

    #[test]
    fn http_transport_requires_api_key() {
        let config = ClientConfig::default();
        let err = HttpTransport::new(&config).err().unwrap();
        assert!(matches!(err, OcrError::InvalidConfig(_)));
    }

    #[test]
    fn unknown_status_has_no_reason() {
        assert_eq!(status_text(599), "599");
        assert_eq!(status_text(404), "404 Not Found");
    }
}
