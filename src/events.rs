//! Outward event feed: the error observer and change notifications.
//!
//! The coordinator and the cache push `SyncEvent`s into an `EventSink`; a
//! presentation layer reads them from the matching `EventFeed` as a stream.
//! Delivery is best-effort: a full buffer drops the newest event rather than
//! blocking a refresh.

use crate::error::{CacheError, SyncError};
use chrono::{DateTime, Utc};
use futures_util::stream::Stream;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Default number of buffered events.
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// The coordinator operation an error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Coins,
    Currencies,
    History,
    CurrentRate,
    Availability,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Coins => "coins",
            Self::Currencies => "currencies",
            Self::History => "history",
            Self::CurrentRate => "current_rate",
            Self::Availability => "availability",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Events emitted to observers.
#[derive(Debug, Clone)]
pub enum SyncEvent {
    CoinsUpdated,
    CurrenciesUpdated,
    RatesUpdated,
    SelectionChanged,
    /// A live rate was merged; `sync_date` is the new sync timestamp.
    Synced { sync_date: DateTime<Utc> },
    SourceAvailable,
    /// A refresh or availability check failed. State was left untouched.
    Error {
        operation: Operation,
        error: Arc<SyncError>,
    },
    /// The cache could not be read or written. Never fatal.
    CacheWarning(Arc<CacheError>),
    CacheStored { sync_date: DateTime<Utc> },
}

/// Sending half of the event feed.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: mpsc::Sender<SyncEvent>,
}

impl EventSink {
    /// Create a connected sink/feed pair.
    pub fn channel(capacity: usize) -> (EventSink, EventFeed) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (
            EventSink { tx },
            EventFeed {
                rx: tokio::sync::Mutex::new(rx),
            },
        )
    }

    /// A sink nobody listens to; every event is discarded.
    pub fn detached() -> Self {
        let (sink, _feed) = Self::channel(1);
        sink
    }

    pub fn emit(&self, event: SyncEvent) {
        if let Err(mpsc::error::TrySendError::Full(event)) = self.tx.try_send(event) {
            tracing::debug!("Event feed full, dropping {:?}", event);
        }
    }
}

/// Receiving half of the event feed.
#[derive(Debug)]
pub struct EventFeed {
    rx: tokio::sync::Mutex<mpsc::Receiver<SyncEvent>>,
}

impl EventFeed {
    /// Stream of events. Ends when every sink is dropped.
    ///
    /// The returned stream borrows `self`; only one consumer reads at a time.
    pub fn events(&self) -> Pin<Box<dyn Stream<Item = SyncEvent> + Send + '_>> {
        Box::pin(futures_util::stream::unfold(&self.rx, |rx| async move {
            let mut guard = rx.lock().await;
            guard.recv().await.map(|event| (event, rx))
        }))
    }

    /// Take every event already buffered without waiting.
    pub fn drain(&self) -> Vec<SyncEvent> {
        let mut drained = Vec::new();
        if let Ok(mut guard) = self.rx.try_lock() {
            while let Ok(event) = guard.try_recv() {
                drained.push(event);
            }
        }
        drained
    }
}
