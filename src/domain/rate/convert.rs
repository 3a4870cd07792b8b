//! Conversions from wire types to domain types for rates.

use super::wire::{PricePoint, QuoteKeys, SimplePriceResponse};
use super::ConversionRate;
use crate::shared::rate_string;
use chrono::{DateTime, Utc};

impl From<PricePoint> for ConversionRate {
    fn from(p: PricePoint) -> Self {
        Self {
            timestamp: p.timestamp,
            rate: rate_string(p.value),
        }
    }
}

impl SimplePriceResponse {
    pub(crate) fn into_rate(self, fetched_at: DateTime<Utc>) -> (ConversionRate, QuoteKeys) {
        (
            ConversionRate {
                timestamp: fetched_at,
                rate: rate_string(self.value),
            },
            self.keys,
        )
    }
}
