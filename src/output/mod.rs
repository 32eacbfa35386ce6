//! Output module for reporting collected quotes

pub mod stats;

pub use stats::{load_statistics, print_statistics, QuoteStatistics};
