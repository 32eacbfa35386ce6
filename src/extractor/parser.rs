//! Listing parser for the live quotes page
//!
//! Parsing happens in two stages:
//! - A structural scan that locates the listing container and enumerates
//!   its rows. A missing container means the layout changed and fails the
//!   whole document.
//! - Field extraction per row. A row that does not match the expected
//!   shape is skipped and recorded; it never fails the batch.
//!
//! The offsets below describe the page layout observed on the live site.
//! Each row is a `<ul>` whose `<li>` items are, in order: symbol cell,
//! price cell, further data cells, and a trailing "details" button.

use crate::extractor::ExtractionError;
use crate::model::StockQuote;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::fmt;

/// Container holding the quote rows
pub const LISTING_CONTAINER_SELECTOR: &str = "div.tBody.ui-unsortable";

const ROW_SELECTOR: &str = "ul";
const LINK_SELECTOR: &str = "a";

/// Trailing row items that are UI affordances rather than data
pub const TRAILING_DECORATION_ITEMS: usize = 1;

/// Item carrying the symbol link
pub const SYMBOL_ITEM_INDEX: usize = 0;

/// Item carrying the last price
pub const PRICE_ITEM_INDEX: usize = 1;

/// The symbol item starts with a decorative link; the real one follows it
pub const SYMBOL_LINK_INDEX: usize = 1;

/// Data items plus the trailing decoration
pub const MIN_ROW_ITEMS: usize = PRICE_ITEM_INDEX + 1 + TRAILING_DECORATION_ITEMS;

pub const MIN_SYMBOL_LINKS: usize = SYMBOL_LINK_INDEX + 1;

/// Suffix closing the `<symbol>-<name-slug>` segment of a detail link
pub const DETAIL_LINK_SUFFIX: &str = "-detay";

/// Reason a row was left out of the batch
#[derive(Debug, Clone, PartialEq)]
pub enum RowSkip {
    /// Fewer `<li>` items than the layout requires
    TooFewItems { found: usize },

    /// The symbol item does not hold the expected links
    MissingSymbolLink { found: usize },

    /// The symbol link text is blank
    EmptySymbol,

    /// The symbol link target has no `<symbol>-<slug>-detay` segment
    NameNotFound { symbol: String },

    /// The price cell is not a non-negative decimal
    InvalidPrice { text: String },
}

impl fmt::Display for RowSkip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooFewItems { found } => {
                write!(f, "expected at least {} items, found {}", MIN_ROW_ITEMS, found)
            }
            Self::MissingSymbolLink { found } => write!(
                f,
                "expected at least {} links in symbol item, found {}",
                MIN_SYMBOL_LINKS, found
            ),
            Self::EmptySymbol => write!(f, "symbol link text is empty"),
            Self::NameNotFound { symbol } => {
                write!(f, "no name segment for symbol {} in link target", symbol)
            }
            Self::InvalidPrice { text } => write!(f, "unparsable price '{}'", text),
        }
    }
}

/// Result of parsing one listing document
#[derive(Debug, Clone, Default)]
pub struct ParsedListing {
    /// Quotes in document order
    pub quotes: Vec<StockQuote>,

    /// Rows left out, with their zero-based row index
    pub skipped: Vec<(usize, RowSkip)>,
}

impl ParsedListing {
    /// Number of rows found in the container
    pub fn row_count(&self) -> usize {
        self.quotes.len() + self.skipped.len()
    }
}

/// Parses the quote listing out of a (normalized) page
///
/// # Returns
///
/// * `Ok(ParsedListing)` - The container was found; rows that could not be
///   read are listed in `skipped`
/// * `Err(ExtractionError::Structure)` - The container is missing or holds
///   no rows
///
/// # Example
///
/// ```
/// use borsa_scraper::extractor::parse_listing;
///
/// let html = r#"<div class="tBody ui-unsortable"><ul><li><a href="/fav">*</a><a href="/hisse/abc-example-co-detay/">ABC </a></li><li>123,45</li><li>Detay</li></ul></div>"#;
/// let listing = parse_listing(html).unwrap();
/// assert_eq!(listing.quotes[0].symbol, "ABC");
/// assert_eq!(listing.quotes[0].name, "EXAMPLE CO");
/// assert_eq!(listing.quotes[0].price, 123.45);
/// ```
pub fn parse_listing(html: &str) -> Result<ParsedListing, ExtractionError> {
    let document = Html::parse_document(html);

    let container_selector = selector(LISTING_CONTAINER_SELECTOR)?;
    let row_selector = selector(ROW_SELECTOR)?;
    let link_selector = selector(LINK_SELECTOR)?;

    let container = document
        .select(&container_selector)
        .next()
        .ok_or_else(|| {
            ExtractionError::Structure(format!(
                "listing container `{}` not found",
                LISTING_CONTAINER_SELECTOR
            ))
        })?;

    let rows: Vec<ElementRef> = container
        .select(&row_selector)
        .filter(|row| !is_nested_row(row, &container))
        .collect();

    if rows.is_empty() {
        return Err(ExtractionError::Structure(format!(
            "listing container `{}` holds no rows",
            LISTING_CONTAINER_SELECTOR
        )));
    }

    let mut listing = ParsedListing::default();

    for (index, row) in rows.into_iter().enumerate() {
        match parse_row(row, &link_selector) {
            Ok(quote) => listing.quotes.push(quote),
            Err(skip) => {
                tracing::debug!(row = index, reason = %skip, "Skipping quote row");
                listing.skipped.push((index, skip));
            }
        }
    }

    Ok(listing)
}

/// Extracts one quote from a row
fn parse_row(row: ElementRef<'_>, link_selector: &Selector) -> Result<StockQuote, RowSkip> {
    let items: Vec<ElementRef> = row
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|child| child.value().name() == "li")
        .collect();

    if items.len() < MIN_ROW_ITEMS {
        return Err(RowSkip::TooFewItems { found: items.len() });
    }
    let items = &items[..items.len() - TRAILING_DECORATION_ITEMS];

    let links: Vec<ElementRef> = items[SYMBOL_ITEM_INDEX].select(link_selector).collect();
    let symbol_link = links
        .get(SYMBOL_LINK_INDEX)
        .ok_or(RowSkip::MissingSymbolLink { found: links.len() })?;

    let symbol = element_text(symbol_link).trim().to_uppercase();
    if symbol.is_empty() {
        return Err(RowSkip::EmptySymbol);
    }

    let name = symbol_link
        .value()
        .attr("href")
        .and_then(|target| extract_name(target, &symbol))
        .ok_or_else(|| RowSkip::NameNotFound {
            symbol: symbol.clone(),
        })?;

    let price_text = element_text(&items[PRICE_ITEM_INDEX]);
    let invalid_price = || RowSkip::InvalidPrice {
        text: price_text.trim().to_string(),
    };
    let price = parse_price(&price_text).ok_or_else(invalid_price)?;

    StockQuote::new(symbol, name, price).ok_or_else(invalid_price)
}

/// Derives the display name from a detail link target
///
/// Looks for `<lowercased symbol>-<slug>-detay` and turns the slug into an
/// uppercase, space-separated name.
///
/// ```
/// use borsa_scraper::extractor::extract_name;
///
/// let name = extract_name("/borsa/hisse-fiyatlari/abc-example-co-detay/", "ABC");
/// assert_eq!(name.as_deref(), Some("EXAMPLE CO"));
/// ```
pub fn extract_name(link_target: &str, symbol: &str) -> Option<String> {
    let pattern = format!(
        "{}-(.*?){}",
        regex::escape(&symbol.to_lowercase()),
        regex::escape(DETAIL_LINK_SUFFIX)
    );
    let slug_pattern = Regex::new(&pattern).ok()?;

    let slug = slug_pattern.captures(link_target.trim())?.get(1)?.as_str();
    if slug.is_empty() {
        return None;
    }

    Some(slug.replace('-', " ").to_uppercase())
}

/// Parses a locale-formatted price such as `123,45`
///
/// Only the first comma is treated as the decimal separator, so grouped
/// values like `1.234,56` are rejected.
pub fn parse_price(text: &str) -> Option<f64> {
    text.trim()
        .replacen(',', ".", 1)
        .parse::<f64>()
        .ok()
        .filter(|price| price.is_finite() && *price >= 0.0)
}

fn element_text(element: &ElementRef<'_>) -> String {
    element.text().collect()
}

/// True when a `<ul>` sits inside another `<ul>` of the listing and so is
/// not a row itself. Wrappers outside the container do not count.
fn is_nested_row(row: &ElementRef<'_>, container: &ElementRef<'_>) -> bool {
    row.ancestors()
        .take_while(|node| node.id() != container.id())
        .filter_map(ElementRef::wrap)
        .any(|ancestor| ancestor.value().name() == ROW_SELECTOR)
}

fn selector(css: &'static str) -> Result<Selector, ExtractionError> {
    Selector::parse(css)
        .map_err(|e| ExtractionError::Structure(format!("invalid selector `{}`: {:?}", css, e)))
}
