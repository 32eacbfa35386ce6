/// A single stock quote extracted from the listing page
#[derive(Debug, Clone, PartialEq)]
pub struct StockQuote {
    /// Ticker symbol, trimmed and uppercase
    pub symbol: String,

    /// Display name derived from the detail link slug
    pub name: String,

    /// Last traded price
    pub price: f64,
}

impl StockQuote {
    /// Builds a quote, rejecting empty symbols and prices that are
    /// negative, NaN or infinite
    pub fn new(symbol: impl Into<String>, name: impl Into<String>, price: f64) -> Option<Self> {
        let symbol = symbol.into();
        if symbol.is_empty() || !price.is_finite() || price < 0.0 {
            return None;
        }

        Some(Self {
            symbol,
            name: name.into(),
            price,
        })
    }
}
