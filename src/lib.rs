//! # coinwatch
//!
//! A polling sync engine for CoinGecko conversion rates with a durable
//! snapshot cache.
//!
//! ## Architecture
//!
//! The crate is organized in layers:
//!
//! 1. **Core**: Identifiers, domain models and their strict decoders
//! 2. **Transport**: `Transport` capability, reqwest-backed `HttpTransport`
//! 3. **Source**: `RemoteDataSource` trait and its CoinGecko implementation
//! 4. **Cache**: `CacheStore` persisting a `Snapshot` through a `BlobStore`
//! 5. **Sync**: `SyncCoordinator` state machine and `PollingDriver` loop
//! 6. **High-Level Client**: `CoinWatch` with its builder
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use coinwatch::prelude::*;
//!
//! let mut watch = CoinWatch::builder()
//!     .cache_path("cache.json")
//!     .build()?;
//!
//! watch.start().await;
//! watch.set_selected_currency("usd").await;
//! let view = watch.view().await;
//! ```

// ── Layer 1: Core ────────────────────────────────────────────────────────────

/// Shared identifier newtypes and number formatting.
pub mod shared;

/// Domain modules (vertical slices): types, wire types, conversions, state.
pub mod domain;

/// Unified error types.
pub mod error;

/// CoinGecko URL constants.
pub mod network;

// ── Layer 2: Transport ───────────────────────────────────────────────────────

/// Raw GET transport and its reqwest implementation.
pub mod http;

// ── Layer 3: Source ──────────────────────────────────────────────────────────

/// Remote data source capability and CoinGecko adapter.
pub mod source;

// ── Layer 4: Cache ───────────────────────────────────────────────────────────

/// Durable snapshot store.
pub mod cache;

// ── Layer 5: Sync ────────────────────────────────────────────────────────────

/// Outward event feed.
pub mod events;

/// Coordinator state machine and polling driver.
pub mod sync;

// ── Layer 6: High-Level Client ───────────────────────────────────────────────

/// `CoinWatch`: the primary entry point.
pub mod client;

// ── Prelude ──────────────────────────────────────────────────────────────────

pub mod prelude {
    // Shared newtypes
    pub use crate::shared::{display_rate, rate_string, CoinId, CurrencyId};

    // Domain types
    pub use crate::domain::coin::Coin;
    pub use crate::domain::currency::Currency;
    pub use crate::domain::rate::{ConversionRate, RateHistory};

    // Errors
    pub use crate::error::{CacheError, SyncError, TransportError};

    // Network
    pub use crate::network::DEFAULT_API_URL;

    // Transport + source
    pub use crate::http::Transport;
    #[cfg(feature = "http")]
    pub use crate::http::HttpTransport;
    pub use crate::source::{CoinGecko, RemoteDataSource};

    // Cache
    pub use crate::cache::{BlobStore, CacheStore, FileBlobStore, MemoryBlobStore, Snapshot};

    // Sync + events
    pub use crate::events::{EventFeed, EventSink, Operation, SyncEvent};
    pub use crate::sync::{
        DriverPhase, LoadedFlags, PollingDriver, RefreshOutcome, Selection, SyncCoordinator,
        SyncView,
    };

    // High-level client
    pub use crate::client::{CoinWatch, CoinWatchBuilder};
}
