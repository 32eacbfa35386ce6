//! Storage module for persisting quotes
//!
//! This module handles all database operations, including:
//! - SQLite database initialization and schema management
//! - Atomic upsert of current prices
//! - Append-only price history

mod schema;
mod sqlite;
mod traits;

pub use sqlite::{SqliteStorage, DEFAULT_QUANTITY};
pub use traits::{QuoteSink, QuoteStore, StorageError, StorageResult};

/// A current-price row in the `stocks` table
#[derive(Debug, Clone, PartialEq)]
pub struct StockRecord {
    pub id: i64,
    pub symbol: String,
    pub name: String,
    pub price: f64,
    pub quantity: i64,
    pub is_active: bool,
    pub last_updated: String,
}

/// What one applied batch changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    /// Symbols seen for the first time
    pub inserted: usize,

    /// Updates to symbols that already had a row
    pub updated: usize,

    /// History rows appended
    pub history_rows: usize,
}
