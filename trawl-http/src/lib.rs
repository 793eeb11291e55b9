//! Minimal HTTP fetch capability for page and feed retrieval.
//!
//! - One shot per URL: a failed or timed-out fetch is reported to the
//!   caller, never retried here (the run loop skips the page instead)
//! - Rotating browser user-agent per request
//! - Structured `tracing` events for request start, response, and errors
//! - Redirects are followed; the final resolved URL is returned alongside
//!   the body so callers can fall back to it as the canonical URL

use std::time::Duration;

use async_trait::async_trait;
use rand::seq::SliceRandom;
use reqwest::{Client, StatusCode, Url};
use thiserror::Error;
use tracing::{debug, warn};

/// Browser user-agents rotated across requests so bursts against one origin
/// don't all present the same signature.
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:125.0) Gecko/20100101 Firefox/125.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:125.0) Gecko/20100101 Firefox/125.0",
];

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("invalid URL: {0}")]
    Url(String),
    #[error("client build failed: {0}")]
    Build(String),
    #[error("network error for {url}: {message}")]
    Network { url: String, message: String },
    #[error("server returned {status} for {url}")]
    Status { status: StatusCode, url: String },
}

/// A fetched page: the raw body plus the URL the request finally resolved
/// to after redirects.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub body: String,
    pub resolved_url: String,
}

/// The fetch seam consumed by the page store coordinator.
///
/// Production code uses [`HttpClient`]; tests substitute canned responses.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_page(&self, url: &str) -> Result<FetchedPage, HttpError>;
}

#[derive(Clone)]
pub struct HttpClient {
    inner: Client,
    pub default_timeout: Duration,
}

impl HttpClient {
    /// Construct a client with a 5s connect timeout and redirect following.
    ///
    /// ```no_run
    /// use trawl_http::HttpClient;
    /// use std::time::Duration;
    ///
    /// let client = HttpClient::new().unwrap();
    /// assert_eq!(client.default_timeout, Duration::from_secs(5));
    /// ```
    pub fn new() -> Result<Self, HttpError> {
        let inner = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| HttpError::Build(e.to_string()))?;
        Ok(Self {
            inner,
            default_timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Override the per-request timeout.
    pub fn with_timeout(mut self, dur: Duration) -> Self {
        self.default_timeout = dur;
        self
    }

    /// GET a URL as text, returning the body and the post-redirect URL.
    pub async fn get_text(&self, url: &str) -> Result<FetchedPage, HttpError> {
        let parsed = Url::parse(url).map_err(|e| HttpError::Url(e.to_string()))?;
        let user_agent = USER_AGENTS
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or(USER_AGENTS[0]);

        debug!(
            host_path = %host_path(&parsed),
            timeout_ms = self.default_timeout.as_millis() as u64,
            "http.request.start"
        );

        let t0 = std::time::Instant::now();
        let resp = self
            .inner
            .get(parsed)
            .header(reqwest::header::USER_AGENT, user_agent)
            .timeout(self.default_timeout)
            .send()
            .await
            .map_err(|e| {
                warn!(url = %url, message = %e, "http.network_error.send");
                HttpError::Network {
                    url: url.to_string(),
                    message: e.to_string(),
                }
            })?;

        let status = resp.status();
        let resolved_url = resp.url().to_string();
        if !status.is_success() {
            warn!(url = %resolved_url, %status, "http.error.status");
            return Err(HttpError::Status {
                status,
                url: resolved_url,
            });
        }

        let body = resp.text().await.map_err(|e| {
            warn!(url = %resolved_url, message = %e, "http.network_error.body");
            HttpError::Network {
                url: resolved_url.clone(),
                message: e.to_string(),
            }
        })?;

        debug!(
            url = %resolved_url,
            %status,
            duration_ms = t0.elapsed().as_millis() as u64,
            body_len = body.len(),
            "http.response"
        );
        Ok(FetchedPage { body, resolved_url })
    }
}

#[async_trait]
impl PageFetcher for HttpClient {
    async fn fetch_page(&self, url: &str) -> Result<FetchedPage, HttpError> {
        self.get_text(url).await
    }
}

/// "host + path" form used in logs, keeping query strings out of the log
/// stream.
fn host_path(url: &Url) -> String {
    format!("{}{}", url.domain().unwrap_or("-"), url.path())
}
