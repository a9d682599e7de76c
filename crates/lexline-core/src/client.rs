//! Paced HTTP transport for the Finlex Open Data API.
//!
//! Uses async reqwest behind a shared tokio runtime but presents a sync
//! interface: the pipeline is strictly sequential and the pacing gate is the
//! only suspension point.

use std::sync::{LazyLock, Mutex};
use std::time::{Duration, Instant};

use crate::retry::{backoff_duration, is_retryable_status};

/// Production API root.
pub const DEFAULT_BASE_URL: &str = "https://opendata.finlex.fi/finlex/avoindata/v1";

const USER_AGENT: &str = concat!("lexline/", env!("CARGO_PKG_VERSION"));

/// Connect timeout
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Shared async HTTP client with connection pooling.
static SHARED_CLIENT: LazyLock<reqwest::Client> = LazyLock::new(|| {
    reqwest::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .user_agent(USER_AGENT)
        .build()
        .expect("failed to build HTTP client")
});

/// Shared tokio runtime for HTTP operations.
pub static SHARED_RUNTIME: LazyLock<tokio::runtime::Runtime> = LazyLock::new(|| {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .expect("failed to build tokio runtime")
});

/// Representation selector for document requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accept {
    Json,
    Xml,
    Pdf,
    Zip,
    Any,
}

impl Accept {
    pub fn mime(self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::Xml => "application/xml",
            Self::Pdf => "application/pdf",
            Self::Zip => "application/zip",
            Self::Any => "*/*",
        }
    }
}

/// A completed HTTP exchange: status plus the full body.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        self.status == 200
    }
}

/// Error types for transport operations
#[derive(Debug)]
pub enum HttpError {
    /// Request never produced a usable response
    Http {
        status: Option<u16>,
        message: String,
    },
    /// I/O error
    Io(std::io::Error),
}

impl std::fmt::Display for HttpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Http {
                status: Some(s),
                message,
            } => write!(f, "HTTP {s}: {message}"),
            Self::Http {
                status: None,
                message,
            } => write!(f, "HTTP error: {message}"),
            Self::Io(e) => write!(f, "IO error: {e}"),
        }
    }
}

impl std::error::Error for HttpError {}

impl From<std::io::Error> for HttpError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl HttpError {
    /// Create HTTP error from reqwest error
    pub fn from_reqwest(e: &reqwest::Error) -> Self {
        Self::Http {
            status: e.status().map(|s| s.as_u16()),
            message: e.to_string(),
        }
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            // Connect failures and timeouts carry no status; statuses we do
            // see here follow the same policy as response statuses.
            Self::Http { status, .. } => match status {
                Some(status) => is_retryable_status(*status),
                None => true,
            },
            Self::Io(e) => e.kind() != std::io::ErrorKind::StorageFull,
        }
    }
}

/// The capability the pipeline needs from its HTTP layer: a paced, retried
/// GET. Production uses [`FinlexClient`]; tests inject a recording fake.
pub trait Transport {
    fn get(
        &self,
        path: &str,
        query: &[(&str, String)],
        accept: Accept,
    ) -> Result<HttpResponse, HttpError>;
}

/// Transport settings.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    /// Minimum wall-clock interval between consecutive requests.
    pub pace: Duration,
    pub max_retries: u32,
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            pace: Duration::from_secs(5),
            max_retries: 5,
            timeout: Duration::from_secs(30),
        }
    }
}

/// HTTP client for the Finlex Open Data API.
///
/// Enforces a minimum interval between outbound requests and retries
/// transient failures with exponential backoff. A retryable status that
/// survives all retries is returned as the final response rather than an
/// error, so callers see the status the server actually sent.
pub struct FinlexClient {
    config: ClientConfig,
    last_request: Mutex<Option<Instant>>,
}

impl FinlexClient {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            last_request: Mutex::new(None),
        }
    }

    /// Block until the pacing interval since the previous request has passed.
    fn pace(&self) {
        let last = *self.last_request.lock().expect("pacing gate poisoned");
        if let Some(at) = last {
            let elapsed = at.elapsed();
            if elapsed < self.config.pace {
                let wait = self.config.pace - elapsed;
                log::debug!("pacing: sleeping {:.2}s", wait.as_secs_f64());
                std::thread::sleep(wait);
            }
        }
    }

    fn stamp(&self) {
        *self.last_request.lock().expect("pacing gate poisoned") = Some(Instant::now());
    }

    fn request_once(
        &self,
        url: &str,
        query: &[(&str, String)],
        accept: Accept,
    ) -> Result<HttpResponse, HttpError> {
        SHARED_RUNTIME.handle().block_on(async {
            let response = SHARED_CLIENT
                .get(url)
                .query(query)
                .header(reqwest::header::ACCEPT, accept.mime())
                .timeout(self.config.timeout)
                .send()
                .await
                .map_err(|e| HttpError::from_reqwest(&e))?;

            let status = response.status().as_u16();
            let body = response
                .bytes()
                .await
                .map_err(|e| HttpError::from_reqwest(&e))?
                .to_vec();

            Ok(HttpResponse { status, body })
        })
    }
}

impl Transport for FinlexClient {
    fn get(
        &self,
        path: &str,
        query: &[(&str, String)],
        accept: Accept,
    ) -> Result<HttpResponse, HttpError> {
        let url = if path.starts_with('/') {
            format!("{}{path}", self.config.base_url)
        } else {
            format!("{}/{path}", self.config.base_url)
        };

        let max_retries = self.config.max_retries;
        let mut attempt = 0u32;
        loop {
            self.pace();
            log::debug!("GET {url} (Accept: {})", accept.mime());
            let result = self.request_once(&url, query, accept);
            self.stamp();

            match result {
                Ok(resp) if is_retryable_status(resp.status) && attempt < max_retries => {
                    attempt += 1;
                    log::debug!(
                        "HTTP {} for {url}, retry {attempt}/{max_retries}",
                        resp.status
                    );
                    std::thread::sleep(backoff_duration(attempt));
                }
                Ok(resp) => {
                    if resp.status >= 400 {
                        log::warn!("HTTP {} for {url}", resp.status);
                    } else {
                        log::debug!("HTTP {}, {} bytes", resp.status, resp.body.len());
                    }
                    return Ok(resp);
                }
                Err(e) if e.is_retryable() && attempt < max_retries => {
                    attempt += 1;
                    log::debug!("request failed: {e}, retry {attempt}/{max_retries}");
                    std::thread::sleep(backoff_duration(attempt));
                }
                Err(e) => {
                    log::error!("request failed permanently: {e}");
                    return Err(e);
                }
            }
        }
    }
}
