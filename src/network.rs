//! Network constants for the CoinGecko API.

/// Default REST API base URL.
pub const DEFAULT_API_URL: &str = "https://api.coingecko.com/api/v3";

pub const COINS_PATH: &str = "/coins/list";
pub const CURRENCIES_PATH: &str = "/simple/supported_vs_currencies";
pub const SIMPLE_PRICE_PATH: &str = "/simple/price";
pub const PING_PATH: &str = "/ping";

/// Market chart path for a coin id (already percent-encoded).
pub fn market_chart_path(coin: &str) -> String {
    format!("/coins/{}/market_chart", coin)
}
