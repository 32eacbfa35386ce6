//! Configuration module for the scraper
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use borsa_scraper::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("scraper.toml")).unwrap();
//! println!("Scraping {} every {}s", config.source.url, config.schedule.interval_secs);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, HttpConfig, ScheduleConfig, SourceConfig, StorageConfig, DEFAULT_SOURCE_URL,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
