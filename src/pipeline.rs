//! One scrape cycle: fetch, parse, persist
//!
//! The scheduler runs `scrape_job` on every tick. Every failure inside a
//! cycle is logged and the cycle abandoned; the next tick starts fresh.

use crate::extractor::Extractor;
use crate::scheduler::TaskFuture;
use crate::storage::{BatchOutcome, QuoteSink};
use crate::ScrapeError;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Summary of a successful cycle
#[derive(Debug, Clone, Copy)]
pub struct CycleReport {
    /// Quotes extracted from the page
    pub quotes: usize,

    /// What the sink changed
    pub outcome: BatchOutcome,

    pub elapsed: Duration,
}

/// Runs one cycle against `sink`
///
/// The sink lock is only held while the batch is applied, never across
/// the network fetch.
pub async fn run_cycle<S>(extractor: &Extractor, sink: &Mutex<S>) -> Result<CycleReport, ScrapeError>
where
    S: QuoteSink,
{
    let started = Instant::now();

    let quotes = extractor.scrape().await?;

    let outcome = {
        let mut sink = sink.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        sink.upsert_and_record_history(&quotes)?
    };

    Ok(CycleReport {
        quotes: quotes.len(),
        outcome,
        elapsed: started.elapsed(),
    })
}

/// Builds the scheduler task that runs one logged cycle per call
pub fn scrape_job<S>(
    extractor: Arc<Extractor>,
    sink: Arc<Mutex<S>>,
) -> impl Fn() -> TaskFuture + Send + Sync + 'static
where
    S: QuoteSink + Send + 'static,
{
    move || -> TaskFuture {
        let extractor = Arc::clone(&extractor);
        let sink = Arc::clone(&sink);

        Box::pin(async move {
            tracing::info!(url = %extractor.source(), "Scraping stocks...");

            match run_cycle(&extractor, &sink).await {
                Ok(report) if report.quotes == 0 => {
                    tracing::warn!("Listing parsed but no quote rows could be read");
                }
                Ok(report) => {
                    tracing::info!(
                        outcome = "success",
                        quotes = report.quotes,
                        inserted = report.outcome.inserted,
                        updated = report.outcome.updated,
                        elapsed_ms = report.elapsed.as_millis() as u64,
                        "Stocks have been upserted successfully"
                    );
                }
                Err(e) => {
                    tracing::error!(error = %e, "Scrape cycle failed, skipping until next run");
                }
            }
        })
    }
}
