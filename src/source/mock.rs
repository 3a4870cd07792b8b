//! Scripted in-memory source for coordinator and driver tests.

use super::RemoteDataSource;
use crate::domain::coin::Coin;
use crate::domain::currency::Currency;
use crate::domain::rate::ConversionRate;
use crate::error::{SyncError, TransportError};
use crate::shared::{CoinId, CurrencyId};

use async_trait::async_trait;
use chrono::Utc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// One historical request as the source saw it.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct HistoryRequest {
    pub coin: CoinId,
    pub currency: CurrencyId,
    pub window_days: u32,
    pub daily_only: bool,
}

#[derive(Default)]
pub(crate) struct ScriptedSource {
    pub coins: Mutex<Vec<Coin>>,
    pub currencies: Mutex<Vec<Currency>>,
    pub history: Mutex<Vec<ConversionRate>>,
    pub current: Mutex<String>,
    pub unavailable: AtomicBool,
    pub fail_coins: AtomicBool,
    pub fail_currencies: AtomicBool,
    pub fail_history: AtomicBool,
    pub fail_current: AtomicBool,
    pub coin_calls: AtomicUsize,
    pub currency_calls: AtomicUsize,
    pub history_calls: AtomicUsize,
    pub current_calls: AtomicUsize,
    pub ping_calls: AtomicUsize,
    pub history_requests: Mutex<Vec<HistoryRequest>>,
    history_gate: Mutex<Option<Arc<Notify>>>,
}

fn unavailable() -> SyncError {
    TransportError::Status {
        status: 503,
        body: "scripted failure".into(),
    }
    .into()
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

impl ScriptedSource {
    /// A source that answers every request successfully.
    pub fn healthy() -> Arc<Self> {
        let source = Self::default();
        *lock(&source.coins) = vec![Coin::new("bitcoin"), Coin::new("ethereum")];
        *lock(&source.currencies) = vec![Currency::new("eur"), Currency::new("usd")];
        *lock(&source.history) = vec![
            ConversionRate::new(ts(1_700_000_000_000), "42.5"),
            ConversionRate::new(ts(1_700_086_400_000), "43.0"),
        ];
        *lock(&source.current) = "43.5".to_string();
        Arc::new(source)
    }

    pub fn set_current(&self, rate: &str) {
        *lock(&self.current) = rate.to_string();
    }

    /// Park historical requests until the returned handle is notified.
    pub fn hold_history(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *lock(&self.history_gate) = Some(Arc::clone(&gate));
        gate
    }

    pub fn last_history_request(&self) -> Option<HistoryRequest> {
        lock(&self.history_requests).last().cloned()
    }
}

pub(crate) fn ts(millis: i64) -> chrono::DateTime<Utc> {
    chrono::DateTime::<Utc>::from_timestamp_millis(millis).unwrap_or_default()
}

#[async_trait]
impl RemoteDataSource for ScriptedSource {
    async fn list_coins(&self) -> Result<Vec<Coin>, SyncError> {
        self.coin_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_coins.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        Ok(lock(&self.coins).clone())
    }

    async fn list_currencies(&self) -> Result<Vec<Currency>, SyncError> {
        self.currency_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_currencies.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        Ok(lock(&self.currencies).clone())
    }

    async fn current_rate(
        &self,
        _coin: &CoinId,
        _currency: &CurrencyId,
    ) -> Result<ConversionRate, SyncError> {
        self.current_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_current.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        Ok(ConversionRate::new(Utc::now(), lock(&self.current).clone()))
    }

    async fn historical_rates(
        &self,
        coin: &CoinId,
        currency: &CurrencyId,
        window_days: u32,
        daily_only: bool,
    ) -> Result<Vec<ConversionRate>, SyncError> {
        self.history_calls.fetch_add(1, Ordering::SeqCst);
        lock(&self.history_requests).push(HistoryRequest {
            coin: coin.clone(),
            currency: currency.clone(),
            window_days,
            daily_only,
        });
        let gate = lock(&self.history_gate).take();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if self.fail_history.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        Ok(lock(&self.history).clone())
    }

    async fn check_available(&self) -> Result<(), SyncError> {
        self.ping_calls.fetch_add(1, Ordering::SeqCst);
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        Ok(())
    }
}
