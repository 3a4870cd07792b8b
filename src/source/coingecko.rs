//! CoinGecko implementation of `RemoteDataSource`.

use super::RemoteDataSource;
use crate::domain::coin::{decode_coin_list, Coin};
use crate::domain::currency::{decode_currency_list, Currency};
use crate::domain::rate::{decode_current_rate, decode_rate_history, ConversionRate};
use crate::error::SyncError;
use crate::http::Transport;
use crate::network;
use crate::shared::{CoinId, CurrencyId};

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;

/// CoinGecko v3 source over any `Transport`.
#[derive(Clone)]
pub struct CoinGecko {
    transport: Arc<dyn Transport>,
}

impl CoinGecko {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// CoinGecko over the reqwest transport.
    #[cfg(feature = "http")]
    pub fn with_http(
        base_url: &str,
        connect_timeout: std::time::Duration,
    ) -> Result<Self, crate::error::TransportError> {
        let transport = crate::http::HttpTransport::new(base_url, connect_timeout)?;
        Ok(Self::new(Arc::new(transport)))
    }
}

#[async_trait]
impl RemoteDataSource for CoinGecko {
    async fn list_coins(&self) -> Result<Vec<Coin>, SyncError> {
        let body = self.transport.get(network::COINS_PATH).await?;
        decode_coin_list(&body)
    }

    async fn list_currencies(&self) -> Result<Vec<Currency>, SyncError> {
        let body = self.transport.get(network::CURRENCIES_PATH).await?;
        decode_currency_list(&body)
    }

    async fn current_rate(
        &self,
        coin: &CoinId,
        currency: &CurrencyId,
    ) -> Result<ConversionRate, SyncError> {
        let body = self.transport.get(&simple_price_path(coin, currency)).await?;
        let (rate, keys) = decode_current_rate(&body, Utc::now())?;
        // Keys are positional; a mismatch is logged but the rate is still used.
        if keys.coin != coin.as_str() || keys.currency != currency.as_str() {
            tracing::warn!(
                requested_coin = %coin,
                requested_currency = %currency,
                "Simple price answered for {}/{}",
                keys.coin,
                keys.currency
            );
        }
        Ok(rate)
    }

    async fn historical_rates(
        &self,
        coin: &CoinId,
        currency: &CurrencyId,
        window_days: u32,
        daily_only: bool,
    ) -> Result<Vec<ConversionRate>, SyncError> {
        let path = market_chart_path(coin, currency, window_days, daily_only);
        let body = self.transport.get(&path).await?;
        decode_rate_history(&body)
    }

    async fn check_available(&self) -> Result<(), SyncError> {
        self.transport.get(network::PING_PATH).await?;
        Ok(())
    }
}

impl std::fmt::Debug for CoinGecko {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoinGecko").finish_non_exhaustive()
    }
}

// ─── Request paths ───────────────────────────────────────────────────────────

fn with_query(path: &str, params: &[(&str, &str)]) -> String {
    let query = params
        .iter()
        .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&");
    if query.is_empty() {
        path.to_string()
    } else {
        format!("{}?{}", path, query)
    }
}

pub(crate) fn simple_price_path(coin: &CoinId, currency: &CurrencyId) -> String {
    with_query(
        network::SIMPLE_PRICE_PATH,
        &[("ids", coin.as_str()), ("vs_currencies", currency.as_str())],
    )
}

pub(crate) fn market_chart_path(
    coin: &CoinId,
    currency: &CurrencyId,
    window_days: u32,
    daily_only: bool,
) -> String {
    let days = window_days.to_string();
    let mut params = vec![("vs_currency", currency.as_str()), ("days", days.as_str())];
    if daily_only {
        params.push(("interval", "daily"));
    }
    let path = network::market_chart_path(&urlencoding::encode(coin.as_str()));
    with_query(&path, &params)
}
