//! Storage traits and error types
//!
//! This module defines the persistence sink interface and its error type.

use crate::model::StockQuote;
use crate::storage::{BatchOutcome, StockRecord};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Destination for extracted quote batches
pub trait QuoteSink {
    /// Applies a batch atomically
    ///
    /// Every distinct symbol ends up with exactly one current row: known
    /// symbols get their price refreshed, unknown ones are inserted with the
    /// default quantity and marked active. Every input record appends one
    /// history row. On any failure nothing from the batch is kept.
    fn upsert_and_record_history(&mut self, batch: &[StockQuote]) -> StorageResult<BatchOutcome>;
}

/// Read access to persisted quotes
pub trait QuoteStore {
    /// Gets the current row for a symbol
    fn get_stock(&self, symbol: &str) -> StorageResult<Option<StockRecord>>;

    /// Lists current rows ordered by symbol
    fn list_stocks(&self) -> StorageResult<Vec<StockRecord>>;

    fn count_stocks(&self) -> StorageResult<u64>;

    /// Counts history rows recorded for a symbol
    fn count_history(&self, symbol: &str) -> StorageResult<u64>;

    fn count_all_history(&self) -> StorageResult<u64>;

    /// Timestamp of the most recent history row, if any
    fn latest_history_time(&self) -> StorageResult<Option<String>>;
}
