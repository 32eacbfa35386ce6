//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the storage traits.

use crate::model::StockQuote;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{QuoteSink, QuoteStore, StorageResult};
use crate::storage::{BatchOutcome, StockRecord};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

/// Quantity given to a symbol the first time it is stored
pub const DEFAULT_QUANTITY: i64 = 10_000;

const STOCK_COLUMNS: &str = "id, symbol, name, price, quantity, is_active, last_updated";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
    default_quantity: i64,
}

impl SqliteStorage {
    /// Opens (or creates) the database at `path`
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    /// * `default_quantity` - Quantity assigned to newly inserted symbols
    pub fn new(path: &Path, default_quantity: i64) -> StorageResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self {
            conn,
            default_quantity,
        })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn,
            default_quantity: DEFAULT_QUANTITY,
        })
    }

    pub fn default_quantity(&self) -> i64 {
        self.default_quantity
    }
}

fn stock_from_row(row: &Row<'_>) -> rusqlite::Result<StockRecord> {
    Ok(StockRecord {
        id: row.get(0)?,
        symbol: row.get(1)?,
        name: row.get(2)?,
        price: row.get(3)?,
        quantity: row.get(4)?,
        is_active: row.get::<_, i64>(5)? != 0,
        last_updated: row.get(6)?,
    })
}

impl QuoteSink for SqliteStorage {
    fn upsert_and_record_history(&mut self, batch: &[StockQuote]) -> StorageResult<BatchOutcome> {
        let now = Utc::now().to_rfc3339();
        let mut outcome = BatchOutcome::default();

        // Dropping the transaction without commit rolls everything back.
        let tx = self.conn.transaction()?;
        {
            let mut find = tx.prepare_cached("SELECT id FROM stocks WHERE symbol = ?1")?;
            let mut insert = tx.prepare_cached(
                "INSERT INTO stocks (symbol, name, price, quantity, is_active, last_updated)
                 VALUES (?1, ?2, ?3, ?4, 1, ?5)",
            )?;
            let mut update =
                tx.prepare_cached("UPDATE stocks SET price = ?1, last_updated = ?2 WHERE id = ?3")?;
            let mut history = tx.prepare_cached(
                "INSERT INTO histories (stock_id, price, recorded_at) VALUES (?1, ?2, ?3)",
            )?;

            for quote in batch {
                let existing: Option<i64> = find
                    .query_row(params![quote.symbol], |row| row.get(0))
                    .optional()?;

                let stock_id = match existing {
                    Some(id) => {
                        update.execute(params![quote.price, now, id])?;
                        outcome.updated += 1;
                        id
                    }
                    None => {
                        let id = insert.insert(params![
                            quote.symbol,
                            quote.name,
                            quote.price,
                            self.default_quantity,
                            now
                        ])?;
                        outcome.inserted += 1;
                        id
                    }
                };

                history.execute(params![stock_id, quote.price, now])?;
                outcome.history_rows += 1;
            }
        }
        tx.commit()?;

        tracing::debug!(
            inserted = outcome.inserted,
            updated = outcome.updated,
            history_rows = outcome.history_rows,
            "Batch committed"
        );

        Ok(outcome)
    }
}

impl QuoteStore for SqliteStorage {
    fn get_stock(&self, symbol: &str) -> StorageResult<Option<StockRecord>> {
        let stock = self
            .conn
            .query_row(
                &format!("SELECT {} FROM stocks WHERE symbol = ?1", STOCK_COLUMNS),
                params![symbol],
                stock_from_row,
            )
            .optional()?;
        Ok(stock)
    }

    fn list_stocks(&self) -> StorageResult<Vec<StockRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {} FROM stocks ORDER BY symbol", STOCK_COLUMNS))?;

        let stocks = stmt
            .query_map([], stock_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(stocks)
    }

    fn count_stocks(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM stocks", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_history(&self, symbol: &str) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM histories h JOIN stocks s ON s.id = h.stock_id WHERE s.symbol = ?1",
            params![symbol],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn count_all_history(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM histories", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn latest_history_time(&self) -> StorageResult<Option<String>> {
        let latest: Option<String> = self
            .conn
            .query_row("SELECT MAX(recorded_at) FROM histories", [], |row| {
                row.get(0)
            })?;
        Ok(latest)
    }
}
