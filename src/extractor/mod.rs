//! Extractor module for fetching and parsing the live quotes page
//!
//! This module contains the extraction pipeline:
//! - HTTP fetching with a pooled, cookie-persisting client
//! - Whitespace normalization of the raw page
//! - Structural parsing of the quote listing into typed records
//!
//! The extractor holds no state between calls besides its HTTP client.

mod fetcher;
mod normalize;
mod parser;

pub use fetcher::{build_http_client, fetch_document, origin_root, probe_origin, FetchCause};
pub use normalize::normalize_document;
pub use parser::{
    extract_name, parse_listing, parse_price, ParsedListing, RowSkip, DETAIL_LINK_SUFFIX,
    LISTING_CONTAINER_SELECTOR,
};

use crate::config::HttpConfig;
use crate::model::StockQuote;
use reqwest::Client;
use thiserror::Error;
use url::Url;

/// Errors that can occur while extracting quotes
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The startup reachability probe failed
    #[error("Connectivity check failed for {url}: {cause}")]
    Connectivity { url: String, cause: FetchCause },

    /// A scheduled fetch failed; the cycle produces no data
    #[error("Failed to fetch {url}: {cause}")]
    Fetch { url: String, cause: FetchCause },

    /// The listing markup is missing from the page
    #[error("Unexpected page structure: {0}")]
    Structure(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),
}

impl ExtractionError {
    /// HTTP status code returned by the server, if that was the failure
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Connectivity { cause, .. } | Self::Fetch { cause, .. } => cause.status_code(),
            _ => None,
        }
    }
}

/// Fetches the quotes page and turns it into `StockQuote` records
pub struct Extractor {
    client: Client,
    source: Url,
}

impl Extractor {
    /// Creates an extractor for the given quotes page
    ///
    /// # Example
    ///
    /// ```no_run
    /// use borsa_scraper::config::HttpConfig;
    /// use borsa_scraper::extractor::Extractor;
    ///
    /// let extractor = Extractor::new(
    ///     "https://bigpara.hurriyet.com.tr/borsa/canli-borsa/",
    ///     &HttpConfig::default(),
    /// )
    /// .unwrap();
    /// ```
    pub fn new(source_url: &str, config: &HttpConfig) -> Result<Self, ExtractionError> {
        let source = Url::parse(source_url)?;
        let client = build_http_client(config)?;
        Ok(Self { client, source })
    }

    /// The configured quotes page
    pub fn source(&self) -> &Url {
        &self.source
    }

    /// Checks once that the source origin answers with a success status
    pub async fn check_connectivity(&self) -> Result<(), ExtractionError> {
        probe_origin(&self.client, &self.source).await
    }

    /// Fetches, normalizes and parses the configured quotes page
    pub async fn scrape(&self) -> Result<Vec<StockQuote>, ExtractionError> {
        self.fetch_and_parse(&self.source).await
    }

    /// Fetches, normalizes and parses the page at `locator`
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<StockQuote>)` - Quotes in page order; may be empty when
    ///   every row was skipped
    /// * `Err(ExtractionError::Fetch)` - Transport failure or non-success status
    /// * `Err(ExtractionError::Structure)` - The listing container is missing
    pub async fn fetch_and_parse(&self, locator: &Url) -> Result<Vec<StockQuote>, ExtractionError> {
        let body = fetch_document(&self.client, locator).await?;
        let listing = parse_listing(&normalize_document(&body))?;

        if !listing.skipped.is_empty() {
            tracing::warn!(
                url = %locator,
                rows = listing.row_count(),
                skipped = listing.skipped.len(),
                "Some quote rows could not be read"
            );
        }

        Ok(listing.quotes)
    }

    /// Releases the pooled idle connections
    ///
    /// The pool lives inside the client, so consuming the extractor is what
    /// closes its connections.
    pub fn close(self) {
        tracing::debug!(url = %self.source, "Closing idle HTTP connections");
        drop(self.client);
    }
}
