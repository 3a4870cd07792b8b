//! Durable snapshot of coordinator state.
//!
//! The cache is best-effort: a missing, unreadable or corrupt blob means a
//! cold start, never a failure. Problems surface as `SyncEvent::CacheWarning`
//! and are logged. A corrupt blob is deleted so the next start is clean.
//!
//! All methods do blocking I/O; async callers should go through
//! `tokio::task::spawn_blocking`.

pub mod blob;

pub use blob::{BlobStore, FileBlobStore, MemoryBlobStore};

use crate::domain::coin::Coin;
use crate::domain::currency::Currency;
use crate::domain::rate::ConversionRate;
use crate::error::CacheError;
use crate::events::{EventSink, SyncEvent};
use crate::sync::Selection;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// File name used when no cache path is configured.
pub const CACHE_FILE_NAME: &str = "cache.json";

/// Everything needed to render the last known state on a cold start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub sync_date: Option<DateTime<Utc>>,
    pub coins: Vec<Coin>,
    pub currencies: Vec<Currency>,
    pub rates: Vec<ConversionRate>,
    pub selection: Selection,
}

/// Platform cache location: `<cache dir>/coinwatch/cache.json`, or
/// `./cache.json` when the platform has none.
pub fn default_cache_path() -> PathBuf {
    dirs::cache_dir()
        .map(|dir| dir.join("coinwatch").join(CACHE_FILE_NAME))
        .unwrap_or_else(|| PathBuf::from(CACHE_FILE_NAME))
}

/// Loads and stores `Snapshot`s through a `BlobStore`.
pub struct CacheStore {
    blob: Arc<dyn BlobStore>,
    events: EventSink,
    /// Sync date of the newest snapshot seen. Held across writes.
    newest: Mutex<Option<DateTime<Utc>>>,
}

impl CacheStore {
    pub fn new(blob: Arc<dyn BlobStore>, events: EventSink) -> Self {
        Self {
            blob,
            events,
            newest: Mutex::new(None),
        }
    }

    pub fn file(path: impl Into<PathBuf>, events: EventSink) -> Self {
        Self::new(Arc::new(FileBlobStore::new(path)), events)
    }

    /// Read the stored snapshot. `None` on a miss, an I/O error or corruption.
    pub fn load(&self) -> Option<Snapshot> {
        let bytes = match self.blob.read() {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                tracing::debug!("No cached snapshot");
                return None;
            }
            Err(e) => {
                tracing::warn!("Cache unreadable: {}", e);
                self.warn(CacheError::Unavailable(e));
                return None;
            }
        };

        match serde_json::from_slice::<Snapshot>(&bytes) {
            Ok(snapshot) => {
                *self.lock_newest() = snapshot.sync_date;
                tracing::debug!(
                    coins = snapshot.coins.len(),
                    rates = snapshot.rates.len(),
                    "Loaded cached snapshot"
                );
                Some(snapshot)
            }
            Err(e) => {
                tracing::warn!("Cache corrupted, deleting: {}", e);
                if let Err(remove) = self.blob.remove() {
                    tracing::warn!("Failed to delete corrupt cache: {}", remove);
                }
                self.warn(CacheError::Corrupted(e));
                None
            }
        }
    }

    /// Persist `snapshot` unless a snapshot at least as new was already
    /// stored. Returns whether the blob was written.
    pub fn store(&self, snapshot: &Snapshot) -> bool {
        let mut newest = self.lock_newest();
        if let Some(stored) = *newest {
            if snapshot.sync_date.map_or(true, |date| date <= stored) {
                tracing::debug!("Skipping cache write, snapshot is not newer");
                return false;
            }
        }

        let bytes = match serde_json::to_vec(snapshot) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!("Snapshot serialization failed: {}", e);
                self.warn(CacheError::Serialize(e));
                return false;
            }
        };

        match self.blob.write(&bytes) {
            Ok(()) => {
                *newest = snapshot.sync_date;
                if let Some(sync_date) = snapshot.sync_date {
                    self.events.emit(SyncEvent::CacheStored { sync_date });
                }
                true
            }
            Err(e) => {
                tracing::warn!("Cache write failed: {}", e);
                self.warn(CacheError::Unavailable(e));
                false
            }
        }
    }

    fn warn(&self, error: CacheError) {
        self.events.emit(SyncEvent::CacheWarning(Arc::new(error)));
    }

    fn lock_newest(&self) -> std::sync::MutexGuard<'_, Option<DateTime<Utc>>> {
        self.newest.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl std::fmt::Debug for CacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheStore")
            .field("newest", &*self.lock_newest())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn snapshot(secs: i64) -> Snapshot {
        let at = Utc.timestamp_opt(secs, 0).unwrap();
        Snapshot {
            sync_date: Some(at),
            coins: vec![Coin::new("bitcoin"), Coin::new("ethereum")],
            currencies: vec![Currency::new("eur")],
            rates: vec![ConversionRate::new(at, "43.5")],
            selection: Selection::new("ethereum", "eur", 7),
        }
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        let original = snapshot(1_700_000_000);

        let store = CacheStore::file(&path, EventSink::detached());
        assert!(store.store(&original));

        let fresh = CacheStore::file(&path, EventSink::detached());
        assert_eq!(fresh.load(), Some(original));
    }

    #[test]
    fn test_snapshot_json_shape() {
        let json = serde_json::to_value(snapshot(1_700_000_000)).unwrap();
        assert_eq!(json["syncDate"], "2023-11-14T22:13:20Z");
        assert_eq!(json["coins"][0]["id"], "bitcoin");
        assert_eq!(json["currencies"][0]["id"], "eur");
        assert_eq!(json["rates"][0]["rate"], "43.5");
        assert_eq!(json["selection"]["historyWindowDays"], 7);
    }

    #[test]
    fn test_missing_file_is_a_silent_miss() {
        let dir = tempfile::tempdir().unwrap();
        let (sink, feed) = EventSink::channel(8);
        let store = CacheStore::file(dir.path().join("cache.json"), sink);
        assert!(store.load().is_none());
        assert!(feed.drain().is_empty());
    }

    #[test]
    fn test_corrupt_file_is_deleted_with_warning() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        std::fs::write(&path, b"{\"syncDate\": 42").unwrap();

        let (sink, feed) = EventSink::channel(8);
        let store = CacheStore::file(&path, sink);
        assert!(store.load().is_none());
        assert!(!path.exists());

        let events = feed.drain();
        assert_eq!(events.len(), 1);
        match &events[0] {
            SyncEvent::CacheWarning(e) => assert!(matches!(**e, CacheError::Corrupted(_))),
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn test_older_snapshot_is_not_written() {
        let blob = Arc::new(MemoryBlobStore::new());
        let store = CacheStore::new(blob.clone(), EventSink::detached());

        assert!(store.store(&snapshot(200)));
        assert!(!store.store(&snapshot(100)));
        assert!(!store.store(&snapshot(200)));
        assert!(store.store(&snapshot(300)));
        assert_eq!(blob.write_count(), 2);
    }

    #[test]
    fn test_loaded_sync_date_guards_later_writes() {
        let bytes = serde_json::to_vec(&snapshot(500)).unwrap();
        let blob = Arc::new(MemoryBlobStore::with_bytes(bytes));
        let store = CacheStore::new(blob.clone(), EventSink::detached());

        assert!(store.load().is_some());
        assert!(!store.store(&snapshot(400)));
        assert_eq!(blob.write_count(), 0);
    }

    #[test]
    fn test_store_emits_cache_stored() {
        let (sink, feed) = EventSink::channel(8);
        let store = CacheStore::new(Arc::new(MemoryBlobStore::new()), sink);
        let snap = snapshot(1_000);
        store.store(&snap);

        let events = feed.drain();
        assert!(matches!(
            events.as_slice(),
            [SyncEvent::CacheStored { sync_date }] if Some(*sync_date) == snap.sync_date
        ));
    }
}
