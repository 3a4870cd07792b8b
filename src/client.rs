//! High-level client: `CoinWatch` wires the source, cache, coordinator and
//! polling driver together behind one handle.

use crate::cache::{default_cache_path, BlobStore, CacheStore, FileBlobStore};
use crate::error::SyncError;
use crate::events::{EventFeed, EventSink, SyncEvent, DEFAULT_EVENT_CAPACITY};
use crate::http::{Transport, DEFAULT_CONNECT_TIMEOUT};
use crate::shared::{CoinId, CurrencyId};
use crate::source::{CoinGecko, RemoteDataSource};
use crate::sync::{DriverPhase, PollingDriver, SyncCoordinator, SyncView, DEFAULT_POLL_INTERVAL};

use futures_util::stream::Stream;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

/// The primary entry point.
///
/// Observers read state through `view()` and changes through `events()`.
/// Selection setters restart the polling cycle so the new pair is loaded
/// from scratch.
pub struct CoinWatch {
    coordinator: SyncCoordinator,
    driver: PollingDriver,
    feed: Arc<EventFeed>,
    bootstrapped: bool,
}

impl CoinWatch {
    pub fn builder() -> CoinWatchBuilder {
        CoinWatchBuilder::default()
    }

    /// Restore the cached snapshot (first call only) and start polling.
    pub async fn start(&mut self) {
        if !self.bootstrapped {
            self.coordinator.bootstrap().await;
            self.bootstrapped = true;
        }
        self.driver.start();
    }

    /// Stop polling and wait for pending cache writes.
    pub async fn stop(&mut self) {
        self.driver.stop().await;
    }

    pub async fn set_selected_coin(&self, coin: impl Into<CoinId>) {
        self.coordinator.set_selected_coin(coin).await;
        self.driver.on_selection_changed();
    }

    pub async fn set_selected_currency(&self, currency: impl Into<CurrencyId>) {
        self.coordinator.set_selected_currency(currency).await;
        self.driver.on_selection_changed();
    }

    pub async fn set_history_window(&self, days: u32) {
        self.coordinator.set_history_window(days).await;
        self.driver.on_selection_changed();
    }

    /// Restart the polling cycle without changing the selection.
    pub fn on_selection_changed(&self) {
        self.driver.on_selection_changed();
    }

    pub async fn view(&self) -> SyncView {
        self.coordinator.view().await
    }

    pub fn phase(&self) -> DriverPhase {
        self.driver.phase()
    }

    pub fn is_running(&self) -> bool {
        self.driver.is_running()
    }

    /// Stream of events. Borrows `self`; see `event_feed` for an owned handle.
    pub fn events(&self) -> Pin<Box<dyn Stream<Item = SyncEvent> + Send + '_>> {
        self.feed.events()
    }

    /// Shared handle to the event feed, for consuming events on another task.
    pub fn event_feed(&self) -> Arc<EventFeed> {
        Arc::clone(&self.feed)
    }

    /// Direct access to the coordinator, e.g. for one-off refreshes.
    pub fn coordinator(&self) -> &SyncCoordinator {
        &self.coordinator
    }
}

impl std::fmt::Debug for CoinWatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoinWatch")
            .field("coordinator", &self.coordinator)
            .field("phase", &self.driver.phase())
            .finish_non_exhaustive()
    }
}

// ═════════════════════════════════════════════════════════════════════════════
// Builder
// ═════════════════════════════════════════════════════════════════════════════

enum CacheLocation {
    Path(PathBuf),
    Blob(Arc<dyn BlobStore>),
}

pub struct CoinWatchBuilder {
    base_url: String,
    cache: CacheLocation,
    poll_interval: Duration,
    connect_timeout: Duration,
    event_capacity: usize,
    transport: Option<Arc<dyn Transport>>,
    source: Option<Arc<dyn RemoteDataSource>>,
}

impl Default for CoinWatchBuilder {
    fn default() -> Self {
        Self {
            base_url: crate::network::DEFAULT_API_URL.to_string(),
            cache: CacheLocation::Path(default_cache_path()),
            poll_interval: DEFAULT_POLL_INTERVAL,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            event_capacity: DEFAULT_EVENT_CAPACITY,
            transport: None,
            source: None,
        }
    }
}

impl CoinWatchBuilder {
    pub fn base_url(mut self, url: &str) -> Self {
        self.base_url = url.to_string();
        self
    }

    pub fn cache_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.cache = CacheLocation::Path(path.into());
        self
    }

    /// Store snapshots somewhere other than a file.
    pub fn cache_blob(mut self, blob: Arc<dyn BlobStore>) -> Self {
        self.cache = CacheLocation::Blob(blob);
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }

    /// Talk to CoinGecko through a custom transport. Ignores `base_url` and
    /// `connect_timeout`.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Replace CoinGecko entirely. Takes precedence over `transport`.
    pub fn source(mut self, source: Arc<dyn RemoteDataSource>) -> Self {
        self.source = Some(source);
        self
    }

    pub fn build(self) -> Result<CoinWatch, SyncError> {
        let source: Arc<dyn RemoteDataSource> = match (self.source, self.transport) {
            (Some(source), _) => source,
            (None, Some(transport)) => Arc::new(CoinGecko::new(transport)),
            (None, None) => default_source(&self.base_url, self.connect_timeout)?,
        };

        let (sink, feed) = EventSink::channel(self.event_capacity);
        let blob: Arc<dyn BlobStore> = match self.cache {
            CacheLocation::Path(path) => {
                tracing::debug!("Cache file: {}", path.display());
                Arc::new(FileBlobStore::new(path))
            }
            CacheLocation::Blob(blob) => blob,
        };
        let cache = Arc::new(CacheStore::new(blob, sink.clone()));
        let coordinator = SyncCoordinator::new(source, cache, sink);
        let driver = PollingDriver::new(coordinator.clone(), self.poll_interval);

        Ok(CoinWatch {
            coordinator,
            driver,
            feed: Arc::new(feed),
            bootstrapped: false,
        })
    }
}

#[cfg(feature = "http")]
fn default_source(
    base_url: &str,
    connect_timeout: Duration,
) -> Result<Arc<dyn RemoteDataSource>, SyncError> {
    Ok(Arc::new(CoinGecko::with_http(base_url, connect_timeout)?))
}

#[cfg(not(feature = "http"))]
fn default_source(
    _base_url: &str,
    _connect_timeout: Duration,
) -> Result<Arc<dyn RemoteDataSource>, SyncError> {
    Err(crate::error::TransportError::Connection(
        "no transport configured; enable the `http` feature or call `transport()`".into(),
    )
    .into())
}
