//! Remote data source: the capability the coordinator pulls data through.
//!
//! Every operation resolves to a single typed outcome. Transport failures and
//! decode failures share the `SyncError` channel and are never retried here;
//! retrying is the polling driver's job.

pub mod coingecko;

#[cfg(test)]
pub(crate) mod mock;

use crate::domain::coin::Coin;
use crate::domain::currency::Currency;
use crate::domain::rate::ConversionRate;
use crate::error::SyncError;
use crate::shared::{CoinId, CurrencyId};
use async_trait::async_trait;

pub use coingecko::CoinGecko;

/// A backend that can list coins and currencies and quote conversion rates.
#[async_trait]
pub trait RemoteDataSource: Send + Sync {
    /// All coins the backend knows, in backend order.
    async fn list_coins(&self) -> Result<Vec<Coin>, SyncError>;

    /// All supported quote currencies.
    async fn list_currencies(&self) -> Result<Vec<Currency>, SyncError>;

    /// The live rate for `coin` in `currency`, stamped with the fetch time.
    async fn current_rate(
        &self,
        coin: &CoinId,
        currency: &CurrencyId,
    ) -> Result<ConversionRate, SyncError>;

    /// Historical rates covering the last `window_days` days, in backend order.
    ///
    /// `daily_only` is forwarded to the backend verbatim (one sample per day
    /// except the most recent partial day); it is not enforced locally.
    async fn historical_rates(
        &self,
        coin: &CoinId,
        currency: &CurrencyId,
        window_days: u32,
        daily_only: bool,
    ) -> Result<Vec<ConversionRate>, SyncError>;

    /// Succeeds when the backend answers its health endpoint.
    async fn check_available(&self) -> Result<(), SyncError>;
}
