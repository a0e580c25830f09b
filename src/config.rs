//! Configuration types for the OCR client.
//!
//! All client behaviour is controlled through [`ClientConfig`], built via its
//! [`ClientConfigBuilder`], including the service base URL.

use crate::error::OcrError;
use crate::progress::ProgressCallback;
use std::fmt;
use std::time::Duration;

/// Default Mathpix OCR API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.mathpix.com/v3";

/// Configuration for an OCR conversion client.
///
/// # Example
/// ```rust
/// use ocrpdf::ClientConfig;
///
/// let config = ClientConfig::builder()
///     .api_key("my-app-key")
///     .poll_timeout_secs(600)
///     .build()
///     .unwrap();
/// assert_eq!(config.poll_interval_ms, 500);
/// ```
#[derive(Clone)]
pub struct ClientConfig {
    /// Mathpix `app_key`, sent as a header on every request.
    pub api_key: String,

    /// Service base URL without trailing slash. Default: [`DEFAULT_BASE_URL`].
    pub base_url: String,

    /// Delay before each status check, in milliseconds. Default: 500.
    ///
    /// Constant: there is no backoff.
    pub poll_interval_ms: u64,

    /// Give up polling after this many seconds. Default: None (poll forever).
    pub poll_timeout_secs: Option<u64>,

    /// Give up polling after this many status checks. Default: None.
    pub max_poll_attempts: Option<u32>,

    /// TCP connect timeout in seconds. Default: 30.
    ///
    /// Only the connect phase is bounded, not the transfer.
    pub connect_timeout_secs: u64,

    /// Size of each chunk read from the source file. Default: 64 KiB.
    pub upload_chunk_size: usize,

    /// Chunks buffered between the file reader and the HTTP body. Default: 8.
    pub pipe_capacity: usize,

    /// Receives upload/progress/download events. Default: None.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            poll_interval_ms: 500,
            poll_timeout_secs: None,
            max_poll_attempts: None,
            connect_timeout_secs: 30,
            upload_chunk_size: 64 * 1024,
            pipe_capacity: 8,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &if self.api_key.is_empty() { "" } else { "<redacted>" })
            .field("base_url", &self.base_url)
            .field("poll_interval_ms", &self.poll_interval_ms)
            .field("poll_timeout_secs", &self.poll_timeout_secs)
            .field("max_poll_attempts", &self.max_poll_attempts)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("upload_chunk_size", &self.upload_chunk_size)
            .field("pipe_capacity", &self.pipe_capacity)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ConversionProgressCallback>"),
            )
            .finish()
    }
}

impl ClientConfig {
    /// Create a new builder for `ClientConfig`.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder {
            config: Self::default(),
        }
    }

    /// Polling policy derived from the `poll_*` fields.
    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy {
            interval: Duration::from_millis(self.poll_interval_ms),
            timeout: self.poll_timeout_secs.map(Duration::from_secs),
            max_attempts: self.max_poll_attempts,
        }
    }

    /// Join `path` onto the base URL.
    pub fn endpoint_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

/// Builder for [`ClientConfig`].
#[derive(Debug)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = key.into();
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn poll_interval_ms(mut self, ms: u64) -> Self {
        self.config.poll_interval_ms = ms;
        self
    }

    pub fn poll_timeout_secs(mut self, secs: u64) -> Self {
        self.config.poll_timeout_secs = Some(secs);
        self
    }

    pub fn max_poll_attempts(mut self, n: u32) -> Self {
        self.config.max_poll_attempts = Some(n);
        self
    }

    pub fn connect_timeout_secs(mut self, secs: u64) -> Self {
        self.config.connect_timeout_secs = secs.max(1);
        self
    }

    pub fn upload_chunk_size(mut self, bytes: usize) -> Self {
        self.config.upload_chunk_size = bytes;
        self
    }

    pub fn pipe_capacity(mut self, chunks: usize) -> Self {
        self.config.pipe_capacity = chunks;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    ///
    /// The API key is not checked here: a client built around a custom
    /// [`crate::transport::Transport`] may not need one. [`crate::transport::HttpTransport`]
    /// rejects an empty key when it is constructed.
    pub fn build(self) -> Result<ClientConfig, OcrError> {
        let c = &self.config;
        if !(c.base_url.starts_with("http://") || c.base_url.starts_with("https://")) {
            return Err(OcrError::InvalidConfig(format!(
                "base URL must start with http:// or https://, got '{}'",
                c.base_url
            )));
        }
        if c.upload_chunk_size == 0 {
            return Err(OcrError::InvalidConfig(
                "upload chunk size must be ≥ 1 byte".into(),
            ));
        }
        if c.pipe_capacity == 0 {
            return Err(OcrError::InvalidConfig(
                "pipe capacity must be ≥ 1 chunk".into(),
            ));
        }
        if c.max_poll_attempts == Some(0) {
            return Err(OcrError::InvalidConfig(
                "max poll attempts must be ≥ 1".into(),
            ));
        }
        Ok(self.config)
    }
}

/// When and how often the poller checks job status.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollPolicy {
    /// Sleep before each status check.
    pub interval: Duration,
    /// Overall bound on time spent polling; `None` is unbounded.
    pub timeout: Option<Duration>,
    /// Bound on the number of status checks; `None` is unbounded.
    pub max_attempts: Option<u32>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        ClientConfig::default().poll_policy()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_service_behaviour() {
        let c = ClientConfig::default();
        assert_eq!(c.base_url, DEFAULT_BASE_URL);
        let p = c.poll_policy();
        assert_eq!(p.interval, Duration::from_millis(500));
        assert_eq!(p.timeout, None);
        assert_eq!(p.max_attempts, None);
    }

    #[test]
    fn builder_sets_poll_bounds() {
        let c = ClientConfig::builder()
            .poll_interval_ms(10)
            .poll_timeout_secs(5)
            .max_poll_attempts(3)
            .build()
            .unwrap();
        let p = c.poll_policy();
        assert_eq!(p.interval, Duration::from_millis(10));
        assert_eq!(p.timeout, Some(Duration::from_secs(5)));
        assert_eq!(p.max_attempts, Some(3));
    }

    #[test]
    fn endpoint_url_joins_cleanly() {
        let c = ClientConfig::builder()
            .base_url("http://localhost:8080/v3/")
            .build()
            .unwrap();
        assert_eq!(c.endpoint_url("pdf-file"), "http://localhost:8080/v3/pdf-file");
        assert_eq!(c.endpoint_url("/pdf/abc"), "http://localhost:8080/v3/pdf/abc");
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(ClientConfig::builder().base_url("ftp://x").build().is_err());
        assert!(ClientConfig::builder().upload_chunk_size(0).build().is_err());
        assert!(ClientConfig::builder().pipe_capacity(0).build().is_err());
        assert!(ClientConfig::builder().max_poll_attempts(0).build().is_err());
    }

    #[test]
    fn debug_redacts_api_key() {
        let c = ClientConfig::builder().api_key("super-secret").build().unwrap();
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("super-secret"), "got: {dbg}");
        assert!(dbg.contains("<redacted>"));
    }
}
