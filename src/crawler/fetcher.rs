//! HTTP fetcher implementation
//!
//! This module handles the stateless half of the fetch backend:
//! - Describing what to fetch and how (`FetchTarget`)
//! - Building the shared HTTP client with user agent and default headers
//! - GET requests with the body decoded from its sniffed encoding
//! - Error classification into a non-success `FetchResult`

use crate::config::FetchConfig;
use crate::{CorpusError, Result};
use async_trait::async_trait;
use chardetng::EncodingDetector;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{redirect::Policy, Client};
use std::time::Duration;
use url::Url;

const MAX_REDIRECTS: usize = 10;

/// How a rendered page is scrolled before its document is read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollPolicy {
    /// Read the document once the settle wait is over
    None,
    /// Scroll to the bottom this many times, waiting after each
    Fixed(u32),
    /// Scroll until the document height stops growing
    UntilStable,
}

/// Which backend serves a target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    Http,
    Rendered(ScrollPolicy),
}

/// A URL together with the way it has to be fetched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTarget {
    pub url: Url,
    pub mode: FetchMode,
}

impl FetchTarget {
    pub fn http(url: Url) -> Self {
        Self {
            url,
            mode: FetchMode::Http,
        }
    }

    pub fn rendered(url: Url, scroll: ScrollPolicy) -> Self {
        Self {
            url,
            mode: FetchMode::Rendered(scroll),
        }
    }
}

/// Result of a fetch operation
#[derive(Debug)]
pub enum FetchResult {
    /// Successfully fetched the page
    Success {
        /// Final URL after redirects
        final_url: String,
        /// HTTP status code (200 for rendered pages)
        status_code: u16,
        /// Decoded page body
        body: String,
    },

    /// Server answered with a non-2xx status
    HttpError {
        /// The HTTP status code
        status_code: u16,
    },

    /// Network error (connection refused, timeout, etc.)
    NetworkError {
        /// Error description
        error: String,
    },

    /// Rendering session failed to navigate or read the document
    RenderError {
        /// Error description
        error: String,
    },
}

impl FetchResult {
    /// The body of a successful fetch; None for failures and blank bodies
    pub fn into_body(self) -> Option<String> {
        match self {
            Self::Success { body, .. } if !body.trim().is_empty() => Some(body),
            _ => None,
        }
    }
}

/// A fetch backend
///
/// Backends never fail a call: every problem is reported as a non-success
/// [`FetchResult`].
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, target: &FetchTarget) -> FetchResult;

    /// Releases anything the backend holds open
    async fn close(&self) {}
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The fetch configuration (user agent, headers, timeout)
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(CorpusError)` - A default header is malformed or the client failed to build
///
/// # Example
///
/// ```no_run
/// use corpus_ripple::config::FetchConfig;
/// use corpus_ripple::crawler::build_http_client;
///
/// let client = build_http_client(&FetchConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &FetchConfig) -> Result<Client> {
    let mut headers = HeaderMap::new();
    for (name, value) in &config.headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| CorpusError::Header(format!("{}: {}", name, e)))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| CorpusError::Header(format!("{}: {}", name, e)))?;
        headers.insert(name, value);
    }

    let client = Client::builder()
        .user_agent(config.user_agent.as_str())
        .default_headers(headers)
        .timeout(config.timeout())
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()?;

    Ok(client)
}

/// Decodes a response body from the encoding its bytes look like
///
/// Several archives declare one charset and serve another, so the declared
/// charset is ignored. A byte order mark still wins.
pub fn decode_body(bytes: &[u8]) -> String {
    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    let encoding = detector.guess(None, true);
    let (text, _, _) = encoding.decode(bytes);
    text.into_owned()
}

/// Stateless HTTP backend sharing one connection pool
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Fetches a URL with a single GET
    ///
    /// | Condition | Result |
    /// |-----------|--------|
    /// | 2xx | `Success` with the decoded body |
    /// | other status | `HttpError` |
    /// | timeout, refused connection, broken body | `NetworkError` |
    pub async fn get(&self, url: &Url) -> FetchResult {
        let response = match self.client.get(url.clone()).send().await {
            Ok(response) => response,
            Err(e) => {
                let error = if e.is_timeout() {
                    "Request timeout".to_string()
                } else if e.is_connect() {
                    format!("Connection failed: {}", e)
                } else {
                    e.to_string()
                };
                tracing::warn!("Fetch failed for {}: {}", url, error);
                return FetchResult::NetworkError { error };
            }
        };

        let status = response.status();
        if !status.is_success() {
            tracing::warn!("HTTP {} for {}", status.as_u16(), url);
            return FetchResult::HttpError {
                status_code: status.as_u16(),
            };
        }

        let final_url = response.url().to_string();
        match response.bytes().await {
            Ok(bytes) => FetchResult::Success {
                final_url,
                status_code: status.as_u16(),
                body: decode_body(&bytes),
            },
            Err(e) => {
                tracing::warn!("Failed to read body of {}: {}", url, e);
                FetchResult::NetworkError {
                    error: e.to_string(),
                }
            }
        }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, target: &FetchTarget) -> FetchResult {
        match target.mode {
            FetchMode::Http => self.get(&target.url).await,
            FetchMode::Rendered(_) => FetchResult::RenderError {
                error: format!("No rendering session for {}", target.url),
            },
        }
    }
}
