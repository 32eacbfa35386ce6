//! Borsa Scraper: a periodic stock quote collector
//!
//! This crate fetches a public live-quotes page on a fixed interval, extracts
//! typed stock records from its markup and persists them to SQLite, upserting
//! current prices and appending a price history row for every observation.

pub mod config;
pub mod extractor;
pub mod model;
pub mod output;
pub mod pipeline;
pub mod scheduler;
pub mod storage;

use thiserror::Error;

/// Main error type for scraper operations
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Extraction error: {0}")]
    Extraction(#[from] extractor::ExtractionError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Scheduler error: {0}")]
    Scheduler(#[from] scheduler::SchedulerError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for scraper operations
pub type Result<T> = std::result::Result<T, ScrapeError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use extractor::Extractor;
pub use model::{JobState, StockQuote};
pub use scheduler::Scheduler;
pub use storage::{QuoteSink, SqliteStorage};
