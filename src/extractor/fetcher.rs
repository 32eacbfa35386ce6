//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests made by the extractor:
//! - Building a pooled, cookie-persisting HTTP client
//! - The one-off connectivity probe against the site origin
//! - GET requests for the quotes page
//! - Error classification

use crate::config::HttpConfig;
use crate::extractor::ExtractionError;
use reqwest::Client;
use std::fmt;
use url::Url;

/// Why a request to the source site failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchCause {
    /// The server answered with a non-success status
    Status(u16),

    /// The request did not complete within the configured timeout
    Timeout,

    /// The connection could not be established
    Connect(String),

    /// Any other transport or body-decoding failure
    Transport(String),
}

impl FetchCause {
    fn from_transport(error: &reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout
        } else if error.is_connect() {
            Self::Connect(error.to_string())
        } else {
            Self::Transport(error.to_string())
        }
    }

    /// HTTP status code, when the failure was a non-success response
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status(code) => Some(*code),
            _ => None,
        }
    }
}

impl fmt::Display for FetchCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status(code) => write!(f, "HTTP status {}", code),
            Self::Timeout => write!(f, "request timeout"),
            Self::Connect(e) => write!(f, "connection failed: {}", e),
            Self::Transport(e) => write!(f, "{}", e),
        }
    }
}

/// Builds the HTTP client used for every request to the source site
///
/// The source requires session affinity, so cookies persist across calls.
/// Idle connections are pooled per host and reused between cycles.
///
/// # Example
///
/// ```no_run
/// use borsa_scraper::config::HttpConfig;
/// use borsa_scraper::extractor::build_http_client;
///
/// let client = build_http_client(&HttpConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &HttpConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(config.timeout())
        .connect_timeout(config.connect_timeout())
        .pool_max_idle_per_host(config.max_idle_connections)
        .pool_idle_timeout(config.idle_timeout())
        .cookie_store(true)
        .gzip(true)
        .brotli(true)
        .build()
}

/// Returns the root of the URL's origin (`scheme://host[:port]/`)
pub fn origin_root(url: &Url) -> Result<Url, ExtractionError> {
    Ok(url.join("/")?)
}

/// Issues a GET to the origin root of `url` and requires a success status
pub async fn probe_origin(client: &Client, url: &Url) -> Result<(), ExtractionError> {
    let root = origin_root(url)?;

    let response = client
        .get(root.clone())
        .send()
        .await
        .map_err(|e| ExtractionError::Connectivity {
            url: root.to_string(),
            cause: FetchCause::from_transport(&e),
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(ExtractionError::Connectivity {
            url: root.to_string(),
            cause: FetchCause::Status(status.as_u16()),
        });
    }

    tracing::debug!(url = %root, status = status.as_u16(), "Origin reachable");
    Ok(())
}

/// Fetches a document and returns its body text
///
/// Non-success statuses and transport failures both abort the cycle with
/// `ExtractionError::Fetch`; no partial body is ever returned.
pub async fn fetch_document(client: &Client, url: &Url) -> Result<String, ExtractionError> {
    let fetch_error = |cause: FetchCause| ExtractionError::Fetch {
        url: url.to_string(),
        cause,
    };

    let response = client
        .get(url.clone())
        .send()
        .await
        .map_err(|e| fetch_error(FetchCause::from_transport(&e)))?;

    let status = response.status();
    if !status.is_success() {
        return Err(fetch_error(FetchCause::Status(status.as_u16())));
    }

    let body = response
        .text()
        .await
        .map_err(|e| fetch_error(FetchCause::from_transport(&e)))?;

    tracing::debug!(url = %url, bytes = body.len(), "Fetched document");
    Ok(body)
}
