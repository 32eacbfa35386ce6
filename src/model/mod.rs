//! Domain model shared by the extractor, scheduler and storage layers
//!
//! # Components
//!
//! - `StockQuote`: one typed record extracted from the listing page
//! - `JobState`: lifecycle of a periodic job owned by the scheduler

mod job_state;
mod quote;

// Re-export main types
pub use job_state::JobState;
pub use quote::StockQuote;
