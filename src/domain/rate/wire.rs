//! Wire types for the simple-price and market-chart responses.

use crate::shared::serde_util::{
    end_of_map, end_of_seq, next_element_required, next_entry_positional, next_value_positional,
};
use chrono::{DateTime, Utc};
use serde::de::{self, Deserialize, Deserializer, IgnoredAny, MapAccess, SeqAccess, Visitor};
use std::fmt;

/// Keys the simple-price body carried around its rate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteKeys {
    pub coin: String,
    pub currency: String,
}

/// `{"<coin>": {"<currency>": <rate>}}`
#[derive(Debug, Clone, PartialEq)]
pub struct SimplePriceResponse {
    pub keys: QuoteKeys,
    pub value: f64,
}

/// The inner `{"<currency>": <rate>}` object.
struct Quote {
    currency: String,
    value: f64,
}

impl<'de> Deserialize<'de> for Quote {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct QuoteVisitor;

        impl<'de> Visitor<'de> for QuoteVisitor {
            type Value = Quote;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an object holding one numeric rate")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Quote, A::Error>
            where
                A: MapAccess<'de>,
            {
                let (currency, value): (String, f64) = next_entry_positional(&mut map, "rate")?;
                end_of_map(&mut map, "rate")?;
                Ok(Quote { currency, value })
            }
        }

        deserializer.deserialize_map(QuoteVisitor)
    }
}

impl<'de> Deserialize<'de> for SimplePriceResponse {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ResponseVisitor;

        impl<'de> Visitor<'de> for ResponseVisitor {
            type Value = SimplePriceResponse;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an object keyed by coin id")
            }

            fn visit_map<A>(self, mut map: A) -> Result<SimplePriceResponse, A::Error>
            where
                A: MapAccess<'de>,
            {
                let (coin, quote): (String, Quote) = next_entry_positional(&mut map, "coin quote")?;
                end_of_map(&mut map, "coin quote")?;
                Ok(SimplePriceResponse {
                    keys: QuoteKeys {
                        coin,
                        currency: quote.currency,
                    },
                    value: quote.value,
                })
            }
        }

        deserializer.deserialize_map(ResponseVisitor)
    }
}

/// `{"prices": [[ms, rate], ..], "market_caps": [..], "total_volumes": [..]}`
///
/// Market caps and volumes are consumed and discarded.
#[derive(Debug, Clone, PartialEq)]
pub struct MarketChartResponse {
    pub prices: Vec<PricePoint>,
}

impl<'de> Deserialize<'de> for MarketChartResponse {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ChartVisitor;

        impl<'de> Visitor<'de> for ChartVisitor {
            type Value = MarketChartResponse;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a market chart object")
            }

            fn visit_map<A>(self, mut map: A) -> Result<MarketChartResponse, A::Error>
            where
                A: MapAccess<'de>,
            {
                let prices: Vec<PricePoint> = next_value_positional(&mut map, "prices")?;
                let _: IgnoredAny = next_value_positional(&mut map, "market_caps")?;
                let _: IgnoredAny = next_value_positional(&mut map, "total_volumes")?;
                end_of_map(&mut map, "total_volumes")?;
                Ok(MarketChartResponse { prices })
            }
        }

        deserializer.deserialize_map(ChartVisitor)
    }
}

/// One `[timestampMillis, rate]` pair.
#[derive(Debug, Clone, PartialEq)]
pub struct PricePoint {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

impl<'de> Deserialize<'de> for PricePoint {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct PointVisitor;

        impl<'de> Visitor<'de> for PointVisitor {
            type Value = PricePoint;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a [timestamp, rate] pair")
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<PricePoint, A::Error>
            where
                A: SeqAccess<'de>,
            {
                let millis: i64 = next_element_required(&mut seq, "timestamp")?;
                let value: f64 = next_element_required(&mut seq, "rate")?;
                end_of_seq(&mut seq, "rate")?;
                let timestamp = DateTime::<Utc>::from_timestamp_millis(millis).ok_or_else(|| {
                    de::Error::custom(format!("timestamp out of range: {}", millis))
                })?;
                Ok(PricePoint { timestamp, value })
            }
        }

        deserializer.deserialize_seq(PointVisitor)
    }
}
