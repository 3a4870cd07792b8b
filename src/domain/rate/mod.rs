//! Rate domain: coin-to-currency conversion rates, live and historical.

mod convert;
pub mod state;
pub mod wire;

use crate::error::SyncError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use state::RateHistory;

/// A conversion rate at a point in time.
///
/// The rate stays a string so the text produced at decode time survives the
/// cache round trip unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionRate {
    /// UTC instant of the sample. CoinGecko reports UTC+0.
    pub timestamp: DateTime<Utc>,
    pub rate: String,
}

impl ConversionRate {
    pub fn new(timestamp: DateTime<Utc>, rate: impl Into<String>) -> Self {
        Self {
            timestamp,
            rate: rate.into(),
        }
    }
}

/// Decode a `/simple/price` body into a rate stamped with `fetched_at`.
///
/// The coin and currency keys are skipped positionally; they are returned
/// alongside the rate so callers can check them against the request.
pub fn decode_current_rate(
    bytes: &[u8],
    fetched_at: DateTime<Utc>,
) -> Result<(ConversionRate, wire::QuoteKeys), SyncError> {
    let response: wire::SimplePriceResponse =
        serde_json::from_slice(bytes).map_err(SyncError::malformed("simple price"))?;
    Ok(response.into_rate(fetched_at))
}

/// Decode a `/coins/{id}/market_chart` body. Rates come back in source order.
pub fn decode_rate_history(bytes: &[u8]) -> Result<Vec<ConversionRate>, SyncError> {
    let response: wire::MarketChartResponse =
        serde_json::from_slice(bytes).map_err(SyncError::malformed("market chart"))?;
    Ok(response.prices.into_iter().map(ConversionRate::from).collect())
}
