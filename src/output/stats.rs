//! Statistics generation from the quotes database
//!
//! This module provides functionality for extracting and displaying
//! what has been collected so far.

use crate::storage::{QuoteStore, StockRecord};
use crate::ScrapeError;

/// Snapshot of the stored quotes
#[derive(Debug, Clone)]
pub struct QuoteStatistics {
    /// Number of distinct symbols stored
    pub stock_count: u64,

    /// Number of history rows across all symbols
    pub history_rows: u64,

    /// Timestamp of the most recent observation
    pub latest_update: Option<String>,

    /// Current rows, ordered by symbol
    pub stocks: Vec<StockRecord>,
}

impl QuoteStatistics {
    /// Average number of observations per symbol
    pub fn observations_per_stock(&self) -> f64 {
        if self.stock_count == 0 {
            0.0
        } else {
            self.history_rows as f64 / self.stock_count as f64
        }
    }
}

/// Loads statistics from storage
pub fn load_statistics(storage: &dyn QuoteStore) -> Result<QuoteStatistics, ScrapeError> {
    Ok(QuoteStatistics {
        stock_count: storage.count_stocks()?,
        history_rows: storage.count_all_history()?,
        latest_update: storage.latest_history_time()?,
        stocks: storage.list_stocks()?,
    })
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &QuoteStatistics) {
    println!("=== Stock Quote Statistics ===\n");

    println!("Overview:");
    println!("  Stocks tracked: {}", stats.stock_count);
    println!("  History rows: {}", stats.history_rows);
    println!(
        "  Observations per stock: {:.1}",
        stats.observations_per_stock()
    );
    println!(
        "  Last update: {}",
        stats.latest_update.as_deref().unwrap_or("never")
    );
    println!();

    if stats.stocks.is_empty() {
        return;
    }

    println!("Current Prices:");
    for stock in &stats.stocks {
        let status = if stock.is_active { "" } else { " (inactive)" };
        println!(
            "  {:<8} {:>12.2}  {}{}",
            stock.symbol, stock.price, stock.name, status
        );
    }
}
