//! Ticker helpers: URL escaping for index symbols and display names.

/// Prefix Yahoo uses for market indices (`^GSPC`).
pub const INDEX_PREFIX: char = '^';

const ESCAPED_PREFIX: &str = "%5E";

const INDEX_NAMES: [(&str, &str); 3] = [("^GSPC", "SPX"), ("^DJI", "DJI"), ("^IXIC", "IXIC")];

const US_EXCHANGES: [&str; 12] = [
    "NYSE", "NASDAQ", "AMEX", "NY", "NAS", "NYQ", "NGS", "NMS", "PCX", "BSE", "NCM", "NGM",
];

/// Escape a symbol for use in a URL path segment.
pub fn encode_symbol(symbol: &str) -> String {
    symbol.replace(INDEX_PREFIX, ESCAPED_PREFIX)
}

/// Reverse [`encode_symbol`]. Accepts either case of the hex escape.
pub fn decode_symbol(symbol: &str) -> String {
    symbol.replace(ESCAPED_PREFIX, "^").replace("%5e", "^")
}

/// Name shown to users: `^GSPC` becomes `SPX`, other indices lose the caret.
pub fn display_name(symbol: &str) -> &str {
    INDEX_NAMES
        .iter()
        .find(|(sym, _)| *sym == symbol)
        .map(|(_, name)| *name)
        .unwrap_or_else(|| symbol.strip_prefix(INDEX_PREFIX).unwrap_or(symbol))
}

pub fn tradingview_url(symbol: &str) -> String {
    format!(
        "https://www.tradingview.com/chart/?symbol={}",
        display_name(symbol)
    )
}

pub fn is_us_exchange(exchange: &str) -> bool {
    let exchange = exchange.to_uppercase();
    US_EXCHANGES.iter().any(|e| exchange.contains(e))
}
