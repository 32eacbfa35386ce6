//! Integration tests for the extraction pipeline
//!
//! These tests use wiremock to serve a copy of the quotes page and exercise
//! fetch, parse and persistence end-to-end.

use borsa_scraper::config::HttpConfig;
use borsa_scraper::extractor::{ExtractionError, Extractor, FetchCause};
use borsa_scraper::pipeline::{run_cycle, scrape_job};
use borsa_scraper::storage::{QuoteStore, SqliteStorage};
use borsa_scraper::{ScrapeError, StockQuote};
use std::sync::{Arc, Mutex};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const QUOTES_PATH: &str = "/borsa/canli-borsa/";

/// A trimmed copy of the live page layout, including its loose whitespace
const LISTING_HTML: &str = r#"<!DOCTYPE html>
<html>
<head><title>Canli Borsa</title></head>
<body>

  <div class="tHead">
    <ul><li>Hisse</li><li>Son</li><li>Fark</li><li></li></ul>
  </div>

  <div class="tBody ui-unsortable">

    <ul class="live-stock-item">
      <li class="cell048">
        <a href="javascript:;" class="fav"><i class="icon-star"></i></a>
        <a href="/borsa/hisse-fiyatlari/abc-example-co-detay/">ABC </a>
      </li>
      <li class="cell064">123,45</li>
      <li class="cell064">%1,20</li>
      <li class="cell032"><a href="/borsa/hisse-fiyatlari/abc-example-co-detay/">Detay</a></li>
    </ul>

    <ul class="live-stock-item">
      <li class="cell048">
        <a href="javascript:;" class="fav"><i class="icon-star"></i></a>
        <a href="/borsa/hisse-fiyatlari/bad-broken-price-detay/">BAD</a>
      </li>
      <li class="cell064">-</li>
      <li class="cell064">%0,00</li>
      <li class="cell032"><a href="/borsa/hisse-fiyatlari/bad-broken-price-detay/">Detay</a></li>
    </ul>

    <ul class="live-stock-item">
      <li class="cell048">
        <a href="javascript:;" class="fav"><i class="icon-star"></i></a>
        <a href="/borsa/hisse-fiyatlari/xyz-holding-as-detay/">XYZ</a>
      </li>
      <li class="cell064">7,5</li>
      <li class="cell064">%-0,40</li>
      <li class="cell032"><a href="/borsa/hisse-fiyatlari/xyz-holding-as-detay/">Detay</a></li>
    </ul>

  </div>
</body>
</html>
"#;

async fn mount_listing(server: &MockServer, body: &str) {
    Mock::given(method("GET"))
        .and(path(QUOTES_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body.to_string())
                .insert_header("content-type", "text/html; charset=utf-8"),
        )
        .mount(server)
        .await;
}

fn extractor_for(server: &MockServer) -> Extractor {
    Extractor::new(&format!("{}{}", server.uri(), QUOTES_PATH), &HttpConfig::default())
        .expect("Failed to build extractor")
}

fn expected_quotes() -> Vec<StockQuote> {
    vec![
        StockQuote::new("ABC", "EXAMPLE CO", 123.45).unwrap(),
        StockQuote::new("XYZ", "HOLDING AS", 7.5).unwrap(),
    ]
}

#[tokio::test]
async fn test_scrape_extracts_quotes_and_skips_bad_row() {
    let server = MockServer::start().await;
    mount_listing(&server, LISTING_HTML).await;

    let extractor = extractor_for(&server);
    let quotes = extractor.scrape().await.expect("Scrape failed");

    assert_eq!(quotes, expected_quotes());
}

#[tokio::test]
async fn test_non_success_status_is_fetch_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(QUOTES_PATH))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let result = extractor_for(&server).scrape().await;

    match result {
        Err(ExtractionError::Fetch { cause, .. }) => assert_eq!(cause, FetchCause::Status(503)),
        other => panic!("Expected fetch error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_missing_container_is_structure_error() {
    let server = MockServer::start().await;
    mount_listing(
        &server,
        "<html><body><div class=\"maintenance\">Bakim calismasi</div></body></html>",
    )
    .await;

    let result = extractor_for(&server).scrape().await;

    assert!(matches!(result, Err(ExtractionError::Structure(_))));
}

#[tokio::test]
async fn test_connectivity_probe_hits_origin_root() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&server)
        .await;

    let extractor = extractor_for(&server);
    assert!(extractor.check_connectivity().await.is_ok());
}

#[tokio::test]
async fn test_connectivity_probe_fails_on_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let result = extractor_for(&server).check_connectivity().await;

    assert!(matches!(result, Err(ExtractionError::Connectivity { .. })));
    assert_eq!(result.unwrap_err().status_code(), Some(500));
}

#[tokio::test]
async fn test_connectivity_probe_fails_when_unreachable() {
    // Bind then release a port so nothing is listening on it.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let extractor = Extractor::new(
        &format!("http://{}{}", addr, QUOTES_PATH),
        &HttpConfig::default(),
    )
    .unwrap();

    let result = extractor.check_connectivity().await;
    assert!(matches!(result, Err(ExtractionError::Connectivity { .. })));
}

#[tokio::test]
async fn test_session_cookie_is_sent_on_later_requests() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).insert_header("set-cookie", "session=abc123; Path=/"))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(QUOTES_PATH))
        .and(header("cookie", "session=abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_string(LISTING_HTML))
        .expect(1)
        .mount(&server)
        .await;

    let extractor = extractor_for(&server);
    extractor.check_connectivity().await.unwrap();
    let quotes = extractor.scrape().await.expect("Cookie was not sent");

    assert_eq!(quotes.len(), 2);
}

#[tokio::test]
async fn test_full_cycle_persists_and_appends_history() {
    let server = MockServer::start().await;
    mount_listing(&server, LISTING_HTML).await;

    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("stocks.db");
    let storage = Mutex::new(SqliteStorage::new(&db_path, 10_000).unwrap());
    let extractor = extractor_for(&server);

    let first = run_cycle(&extractor, &storage).await.expect("First cycle failed");
    let second = run_cycle(&extractor, &storage).await.expect("Second cycle failed");

    assert_eq!(first.quotes, 2);
    assert_eq!(first.outcome.inserted, 2);
    assert_eq!(second.outcome.inserted, 0);
    assert_eq!(second.outcome.updated, 2);

    // Reopen from disk to check what was committed.
    drop(storage);
    let storage = SqliteStorage::new(&db_path, 10_000).unwrap();
    assert_eq!(storage.count_stocks().unwrap(), 2);
    assert_eq!(storage.count_history("ABC").unwrap(), 2);
    assert_eq!(storage.count_history("XYZ").unwrap(), 2);
    assert!(storage.get_stock("BAD").unwrap().is_none());

    let abc = storage.get_stock("ABC").unwrap().unwrap();
    assert_eq!(abc.name, "EXAMPLE CO");
    assert_eq!(abc.price, 123.45);
    assert_eq!(abc.quantity, 10_000);
}

#[tokio::test]
async fn test_failed_cycle_writes_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(QUOTES_PATH))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let storage = Mutex::new(SqliteStorage::new_in_memory().unwrap());
    let result = run_cycle(&extractor_for(&server), &storage).await;

    assert!(matches!(result, Err(ScrapeError::Extraction(_))));
    assert_eq!(storage.lock().unwrap().count_all_history().unwrap(), 0);
}

#[tokio::test]
async fn test_scrape_job_swallows_cycle_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(QUOTES_PATH))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let storage = Arc::new(Mutex::new(SqliteStorage::new_in_memory().unwrap()));
    let job = scrape_job(Arc::new(extractor_for(&server)), Arc::clone(&storage));

    // Completes without panicking; the error only reaches the log.
    job().await;
    job().await;

    assert_eq!(storage.lock().unwrap().count_stocks().unwrap(), 0);
}

#[tokio::test]
async fn test_scrape_job_persists_on_success() {
    let server = MockServer::start().await;
    mount_listing(&server, LISTING_HTML).await;

    let storage = Arc::new(Mutex::new(SqliteStorage::new_in_memory().unwrap()));
    let job = scrape_job(Arc::new(extractor_for(&server)), Arc::clone(&storage));

    job().await;

    let storage = storage.lock().unwrap();
    assert_eq!(storage.count_stocks().unwrap(), 2);
    assert_eq!(storage.count_all_history().unwrap(), 2);
}
