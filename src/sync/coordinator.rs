//! Sync coordinator: owns the observable state and applies refresh results.
//!
//! Fetches run without holding the state lock; each result is applied under a
//! single write lock so readers only ever see fully old or fully new state.
//! Every selection change bumps a generation counter. A history or live-rate
//! success that started under an older generation is discarded.

use super::selection::{LoadedFlags, Selection};
use crate::cache::{CacheStore, Snapshot};
use crate::domain::coin::Coin;
use crate::domain::currency::Currency;
use crate::domain::rate::{ConversionRate, RateHistory};
use crate::error::SyncError;
use crate::events::{EventSink, Operation, SyncEvent};
use crate::shared::{CoinId, CurrencyId};
use crate::source::RemoteDataSource;

use async_lock::RwLock;
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;

/// Granularity requested for every historical fetch.
const HISTORY_DAILY_ONLY: bool = true;

/// Coordinator state. Mutated only under the coordinator's write lock.
#[derive(Debug, Default)]
pub(crate) struct SyncState {
    selection: Selection,
    coins: Vec<Coin>,
    currencies: Vec<Currency>,
    rates: RateHistory,
    sync_date: Option<DateTime<Utc>>,
    loaded: LoadedFlags,
    generation: u64,
    last_error: Option<Arc<SyncError>>,
}

impl SyncState {
    fn snapshot(&self) -> Snapshot {
        Snapshot {
            sync_date: self.sync_date,
            coins: self.coins.clone(),
            currencies: self.currencies.clone(),
            rates: self.rates.to_vec(),
            selection: self.selection.clone(),
        }
    }

    fn invalidate_history(&mut self) {
        self.rates.clear();
        self.loaded.history = false;
        self.generation += 1;
    }
}

/// Read-only copy of the observable state.
#[derive(Debug, Clone, Default)]
pub struct SyncView {
    pub selection: Selection,
    pub coins: Vec<Coin>,
    pub currencies: Vec<Currency>,
    /// Newest first; index 0 is the live rate once one has been merged.
    pub rates: Vec<ConversionRate>,
    pub sync_date: Option<DateTime<Utc>>,
    pub last_error: Option<Arc<SyncError>>,
}

impl SyncView {
    pub fn latest_rate(&self) -> Option<&ConversionRate> {
        self.rates.first()
    }
}

/// How a single refresh ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Applied,
    /// Succeeded, but the selection changed while in flight.
    Stale,
    Failed,
}

impl RefreshOutcome {
    pub fn is_applied(self) -> bool {
        self == Self::Applied
    }
}

/// Owns coordinator state and drives refreshes against a `RemoteDataSource`.
///
/// Cheap to clone; clones share state.
#[derive(Clone)]
pub struct SyncCoordinator {
    source: Arc<dyn RemoteDataSource>,
    cache: Arc<CacheStore>,
    events: EventSink,
    state: Arc<RwLock<SyncState>>,
    pending_writes: Arc<Mutex<Vec<JoinHandle<bool>>>>,
}

impl SyncCoordinator {
    pub fn new(source: Arc<dyn RemoteDataSource>, cache: Arc<CacheStore>, events: EventSink) -> Self {
        Self {
            source,
            cache,
            events,
            state: Arc::new(RwLock::new(SyncState::default())),
            pending_writes: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Adopt the cached snapshot, or defaults on a miss. Returns whether the
    /// cache hit. Loaded flags always start false.
    pub async fn bootstrap(&self) -> bool {
        let cache = Arc::clone(&self.cache);
        let snapshot = match tokio::task::spawn_blocking(move || cache.load()).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!("Cache load task failed: {}", e);
                None
            }
        };

        let mut state = self.state.write().await;
        let generation = state.generation + 1;
        let hit = snapshot.is_some();
        *state = match snapshot {
            Some(snapshot) => {
                tracing::info!(
                    coin = %snapshot.selection.coin,
                    currency = %snapshot.selection.currency,
                    "Restored cached state"
                );
                SyncState {
                    selection: snapshot.selection,
                    coins: snapshot.coins,
                    currencies: snapshot.currencies,
                    rates: RateHistory::from_rates(snapshot.rates),
                    sync_date: snapshot.sync_date,
                    ..SyncState::default()
                }
            }
            None => SyncState::default(),
        };
        state.generation = generation;
        drop(state);

        self.events.emit(SyncEvent::SelectionChanged);
        self.events.emit(SyncEvent::CoinsUpdated);
        self.events.emit(SyncEvent::CurrenciesUpdated);
        self.events.emit(SyncEvent::RatesUpdated);
        hit
    }

    // ── Refreshes ────────────────────────────────────────────────────────

    pub async fn refresh_coins(&self) -> RefreshOutcome {
        match self.source.list_coins().await {
            Ok(coins) => {
                let mut state = self.state.write().await;
                tracing::debug!(count = coins.len(), "Coins refreshed");
                state.coins = coins;
                state.loaded.coins = true;
                state.last_error = None;
                drop(state);
                self.events.emit(SyncEvent::CoinsUpdated);
                RefreshOutcome::Applied
            }
            Err(e) => self.fail(Operation::Coins, e).await,
        }
    }

    pub async fn refresh_currencies(&self) -> RefreshOutcome {
        match self.source.list_currencies().await {
            Ok(currencies) => {
                let mut state = self.state.write().await;
                tracing::debug!(count = currencies.len(), "Currencies refreshed");
                state.currencies = currencies;
                state.loaded.currencies = true;
                state.last_error = None;
                drop(state);
                self.events.emit(SyncEvent::CurrenciesUpdated);
                RefreshOutcome::Applied
            }
            Err(e) => self.fail(Operation::Currencies, e).await,
        }
    }

    /// Replace the rate list with daily history for the current selection,
    /// newest first.
    pub async fn refresh_history(&self) -> RefreshOutcome {
        let (selection, generation) = self.current_selection().await;
        let result = self
            .source
            .historical_rates(
                &selection.coin,
                &selection.currency,
                selection.history_window_days,
                HISTORY_DAILY_ONLY,
            )
            .await;

        match result {
            Ok(rates) => {
                let mut state = self.state.write().await;
                if state.generation != generation {
                    tracing::debug!("Discarding history for {}/{}", selection.coin, selection.currency);
                    return RefreshOutcome::Stale;
                }
                state.rates.replace_history(rates);
                state.loaded.history = true;
                state.last_error = None;
                tracing::debug!(count = state.rates.len(), "History refreshed");
                drop(state);
                self.events.emit(SyncEvent::RatesUpdated);
                RefreshOutcome::Applied
            }
            Err(e) => self.fail(Operation::History, e).await,
        }
    }

    /// Merge the live rate into slot 0 and stamp the sync date. Persists a
    /// snapshot once coins, currencies and history have all loaded.
    pub async fn refresh_current_rate(&self) -> RefreshOutcome {
        let (selection, generation) = self.current_selection().await;
        let result = self
            .source
            .current_rate(&selection.coin, &selection.currency)
            .await;

        let rate = match result {
            Ok(rate) => rate,
            Err(e) => return self.fail(Operation::CurrentRate, e).await,
        };

        let mut state = self.state.write().await;
        if state.generation != generation {
            tracing::debug!("Discarding live rate for {}/{}", selection.coin, selection.currency);
            return RefreshOutcome::Stale;
        }
        let sync_date = rate.timestamp;
        state.rates.merge_current(rate);
        state.sync_date = Some(sync_date);
        state.last_error = None;
        let snapshot = state.loaded.all().then(|| state.snapshot());
        drop(state);

        self.events.emit(SyncEvent::RatesUpdated);
        self.events.emit(SyncEvent::Synced { sync_date });
        if let Some(snapshot) = snapshot {
            self.persist(snapshot);
        }
        RefreshOutcome::Applied
    }

    /// Ping the source. Failures are reported like any refresh failure.
    pub async fn check_availability(&self) -> bool {
        match self.source.check_available().await {
            Ok(()) => {
                self.events.emit(SyncEvent::SourceAvailable);
                true
            }
            Err(e) => {
                self.fail(Operation::Availability, e).await;
                false
            }
        }
    }

    // ── Selection ────────────────────────────────────────────────────────

    /// Select a coin. Clears the rate list and history flag.
    pub async fn set_selected_coin(&self, coin: impl Into<CoinId>) {
        let coin = coin.into();
        self.change_selection(|selection| selection.coin = coin).await;
    }

    /// Select a quote currency. Clears the rate list and history flag.
    pub async fn set_selected_currency(&self, currency: impl Into<CurrencyId>) {
        let currency = currency.into();
        self.change_selection(|selection| selection.currency = currency)
            .await;
    }

    /// Change how many days of history to fetch. Clears the rate list and
    /// history flag.
    pub async fn set_history_window(&self, days: u32) {
        self.change_selection(|selection| selection.history_window_days = days)
            .await;
    }

    async fn change_selection(&self, update: impl FnOnce(&mut Selection)) {
        let mut state = self.state.write().await;
        update(&mut state.selection);
        state.invalidate_history();
        tracing::info!(
            coin = %state.selection.coin,
            currency = %state.selection.currency,
            days = state.selection.history_window_days,
            "Selection changed"
        );
        drop(state);
        self.events.emit(SyncEvent::SelectionChanged);
        self.events.emit(SyncEvent::RatesUpdated);
    }

    // ── Observation ──────────────────────────────────────────────────────

    pub async fn view(&self) -> SyncView {
        let state = self.state.read().await;
        SyncView {
            selection: state.selection.clone(),
            coins: state.coins.clone(),
            currencies: state.currencies.clone(),
            rates: state.rates.to_vec(),
            sync_date: state.sync_date,
            last_error: state.last_error.clone(),
        }
    }

    pub async fn selection(&self) -> Selection {
        self.state.read().await.selection.clone()
    }

    pub async fn loaded(&self) -> LoadedFlags {
        self.state.read().await.loaded
    }

    /// Wait for every cache write started so far.
    pub async fn flush_cache(&self) {
        let pending: Vec<_> = std::mem::take(&mut *self.lock_pending());
        for handle in pending {
            if let Err(e) = handle.await {
                tracing::warn!("Cache write task failed: {}", e);
            }
        }
    }

    // ── Internals ────────────────────────────────────────────────────────

    async fn current_selection(&self) -> (Selection, u64) {
        let state = self.state.read().await;
        (state.selection.clone(), state.generation)
    }

    async fn fail(&self, operation: Operation, error: SyncError) -> RefreshOutcome {
        tracing::warn!("{} refresh failed: {}", operation, error);
        let error = Arc::new(error);
        self.state.write().await.last_error = Some(Arc::clone(&error));
        self.events.emit(SyncEvent::Error { operation, error });
        RefreshOutcome::Failed
    }

    fn persist(&self, snapshot: Snapshot) {
        let cache = Arc::clone(&self.cache);
        let handle = tokio::task::spawn_blocking(move || cache.store(&snapshot));
        let mut pending = self.lock_pending();
        pending.retain(|h| !h.is_finished());
        pending.push(handle);
    }

    fn lock_pending(&self) -> std::sync::MutexGuard<'_, Vec<JoinHandle<bool>>> {
        self.pending_writes.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl std::fmt::Debug for SyncCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncCoordinator")
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryBlobStore;
    use crate::source::mock::{ts, ScriptedSource};
    use std::sync::atomic::Ordering;

    struct Harness {
        source: Arc<ScriptedSource>,
        blob: Arc<MemoryBlobStore>,
        coordinator: SyncCoordinator,
        feed: crate::events::EventFeed,
    }

    fn harness_with_blob(blob: MemoryBlobStore) -> Harness {
        let source = ScriptedSource::healthy();
        let blob = Arc::new(blob);
        let (sink, feed) = EventSink::channel(256);
        let cache = Arc::new(CacheStore::new(blob.clone(), sink.clone()));
        let coordinator = SyncCoordinator::new(source.clone(), cache, sink);
        Harness {
            source,
            blob,
            coordinator,
            feed,
        }
    }

    fn harness() -> Harness {
        harness_with_blob(MemoryBlobStore::new())
    }

    async fn full_load(c: &SyncCoordinator) {
        assert!(c.refresh_coins().await.is_applied());
        assert!(c.refresh_currencies().await.is_applied());
        assert!(c.refresh_history().await.is_applied());
    }

    #[tokio::test]
    async fn test_bootstrap_miss_uses_defaults() {
        let h = harness();
        assert!(!h.coordinator.bootstrap().await);

        let view = h.coordinator.view().await;
        assert_eq!(view.selection, Selection::default());
        assert!(view.coins.is_empty());
        assert!(view.rates.is_empty());
        assert!(view.sync_date.is_none());
    }

    #[tokio::test]
    async fn test_bootstrap_hit_adopts_snapshot_but_not_flags() {
        let snapshot = Snapshot {
            sync_date: Some(ts(1_700_000_000_000)),
            coins: vec![Coin::new("dogecoin")],
            currencies: vec![Currency::new("usd")],
            rates: vec![ConversionRate::new(ts(1_700_000_000_000), "0.07")],
            selection: Selection::new("dogecoin", "usd", 30),
        };
        let bytes = serde_json::to_vec(&snapshot).unwrap();
        let h = harness_with_blob(MemoryBlobStore::with_bytes(bytes));

        assert!(h.coordinator.bootstrap().await);
        let view = h.coordinator.view().await;
        assert_eq!(view.selection, snapshot.selection);
        assert_eq!(view.coins, snapshot.coins);
        assert_eq!(view.rates, snapshot.rates);
        assert_eq!(view.sync_date, snapshot.sync_date);
        assert_eq!(h.coordinator.loaded().await, LoadedFlags::default());
    }

    #[tokio::test]
    async fn test_refreshes_set_lists_and_flags() {
        let h = harness();
        full_load(&h.coordinator).await;

        let view = h.coordinator.view().await;
        assert_eq!(view.coins.len(), 2);
        assert_eq!(view.currencies.len(), 2);
        let rates: Vec<_> = view.rates.iter().map(|r| r.rate.as_str()).collect();
        assert_eq!(rates, ["43.0", "42.5"]);
        assert!(h.coordinator.loaded().await.all());

        let request = h.source.last_history_request().unwrap();
        assert_eq!(request.window_days, 14);
        assert!(request.daily_only);
    }

    #[tokio::test]
    async fn test_failed_refresh_leaves_state_and_reports_once() {
        let h = harness();
        h.coordinator.refresh_coins().await;
        h.feed.drain();

        h.source.fail_coins.store(true, Ordering::SeqCst);
        h.source.coins.lock().unwrap().clear();
        assert_eq!(h.coordinator.refresh_coins().await, RefreshOutcome::Failed);

        let view = h.coordinator.view().await;
        assert_eq!(view.coins.len(), 2);
        assert_eq!(view.last_error.as_ref().and_then(|e| e.status()), Some(503));

        let errors: Vec<_> = h
            .feed
            .drain()
            .into_iter()
            .filter(|e| matches!(e, SyncEvent::Error { operation: Operation::Coins, .. }))
            .collect();
        assert_eq!(errors.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_history_keeps_flag_false() {
        let h = harness();
        h.source.fail_history.store(true, Ordering::SeqCst);
        assert_eq!(h.coordinator.refresh_history().await, RefreshOutcome::Failed);
        assert!(!h.coordinator.loaded().await.history);
        assert!(h.coordinator.view().await.rates.is_empty());
    }

    #[tokio::test]
    async fn test_current_rate_appends_to_empty_list() {
        let h = harness();
        assert!(h.coordinator.refresh_current_rate().await.is_applied());

        let view = h.coordinator.view().await;
        assert_eq!(view.rates.len(), 1);
        assert_eq!(view.rates[0].rate, "43.5");
        assert_eq!(view.sync_date, Some(view.rates[0].timestamp));
    }

    #[tokio::test]
    async fn test_current_rate_replaces_only_first() {
        let h = harness();
        h.coordinator.refresh_history().await;
        h.coordinator.refresh_current_rate().await;

        let view = h.coordinator.view().await;
        let rates: Vec<_> = view.rates.iter().map(|r| r.rate.as_str()).collect();
        assert_eq!(rates, ["43.5", "42.5"]);
        assert_eq!(view.rates[1].timestamp, ts(1_700_000_000_000));
    }

    #[tokio::test]
    async fn test_failed_current_rate_changes_nothing() {
        let h = harness();
        h.coordinator.refresh_history().await;
        let before = h.coordinator.view().await;

        h.source.fail_current.store(true, Ordering::SeqCst);
        assert_eq!(
            h.coordinator.refresh_current_rate().await,
            RefreshOutcome::Failed
        );

        let after = h.coordinator.view().await;
        assert_eq!(after.rates, before.rates);
        assert_eq!(after.sync_date, None);
    }

    #[tokio::test]
    async fn test_selection_change_invalidates_history_only() {
        let h = harness();
        full_load(&h.coordinator).await;
        h.coordinator.refresh_current_rate().await;

        h.coordinator.set_selected_coin("ethereum").await;

        let view = h.coordinator.view().await;
        assert_eq!(view.selection.coin.as_str(), "ethereum");
        assert!(view.rates.is_empty());
        let loaded = h.coordinator.loaded().await;
        assert!(loaded.coins);
        assert!(loaded.currencies);
        assert!(!loaded.history);
    }

    #[tokio::test]
    async fn test_history_window_change_invalidates_history() {
        let h = harness();
        h.coordinator.refresh_history().await;
        h.coordinator.set_history_window(30).await;

        assert!(h.coordinator.view().await.rates.is_empty());
        assert!(!h.coordinator.loaded().await.history);

        h.coordinator.refresh_history().await;
        assert_eq!(h.source.last_history_request().unwrap().window_days, 30);
    }

    #[tokio::test]
    async fn test_cache_write_requires_all_flags() {
        let h = harness();
        h.coordinator.refresh_coins().await;
        h.coordinator.refresh_currencies().await;
        h.coordinator.refresh_current_rate().await;
        h.coordinator.flush_cache().await;
        assert_eq!(h.blob.write_count(), 0);

        h.coordinator.refresh_history().await;
        h.coordinator.refresh_current_rate().await;
        h.coordinator.flush_cache().await;
        assert_eq!(h.blob.write_count(), 1);
    }

    #[tokio::test]
    async fn test_no_cache_write_after_flag_flips_false() {
        let h = harness();
        full_load(&h.coordinator).await;
        h.coordinator.refresh_current_rate().await;
        h.coordinator.flush_cache().await;
        assert_eq!(h.blob.write_count(), 1);

        h.coordinator.set_selected_currency("usd").await;
        assert!(h.coordinator.refresh_current_rate().await.is_applied());
        h.coordinator.flush_cache().await;
        assert_eq!(h.blob.write_count(), 1);
    }

    #[tokio::test]
    async fn test_stored_snapshot_matches_state() {
        let h = harness();
        full_load(&h.coordinator).await;
        h.coordinator.refresh_current_rate().await;
        h.coordinator.flush_cache().await;

        let stored: Snapshot = serde_json::from_slice(&h.blob.contents().unwrap()).unwrap();
        let view = h.coordinator.view().await;
        assert_eq!(stored.sync_date, view.sync_date);
        assert_eq!(stored.rates, view.rates);
        assert_eq!(stored.coins, view.coins);
        assert_eq!(stored.selection, view.selection);
    }

    #[tokio::test]
    async fn test_late_history_is_discarded_after_selection_change() {
        let h = harness();
        let gate = h.source.hold_history();

        let coordinator = h.coordinator.clone();
        let in_flight = tokio::spawn(async move { coordinator.refresh_history().await });
        while h.source.history_calls.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }

        h.coordinator.set_selected_coin("ethereum").await;
        gate.notify_one();

        assert_eq!(in_flight.await.unwrap(), RefreshOutcome::Stale);
        assert!(h.coordinator.view().await.rates.is_empty());
        assert!(!h.coordinator.loaded().await.history);
    }

    #[tokio::test]
    async fn test_availability_reports_failure() {
        let h = harness();
        assert!(h.coordinator.check_availability().await);

        h.source.unavailable.store(true, Ordering::SeqCst);
        assert!(!h.coordinator.check_availability().await);
        let events = h.feed.drain();
        assert!(events
            .iter()
            .any(|e| matches!(e, SyncEvent::SourceAvailable)));
        assert!(events.iter().any(|e| matches!(
            e,
            SyncEvent::Error {
                operation: Operation::Availability,
                ..
            }
        )));
    }
}
