//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the quotes database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Current state of every symbol ever seen
CREATE TABLE IF NOT EXISTS stocks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    symbol TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    price REAL NOT NULL CHECK (price >= 0),
    quantity INTEGER NOT NULL,
    is_active INTEGER NOT NULL DEFAULT 1,
    last_updated TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_stocks_symbol ON stocks(symbol);

-- Append-only price observations
CREATE TABLE IF NOT EXISTS histories (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    stock_id INTEGER NOT NULL REFERENCES stocks(id),
    price REAL NOT NULL CHECK (price >= 0),
    recorded_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_histories_stock ON histories(stock_id);
CREATE INDEX IF NOT EXISTS idx_histories_recorded_at ON histories(recorded_at);
"#;

/// Initializes the database schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
