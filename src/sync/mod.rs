//! Sync engine: the coordinator state machine and the polling driver.
//!
//! `SyncCoordinator` owns the observable state and applies each refresh
//! atomically. `PollingDriver` runs the availability gate and the refresh
//! schedule on a background task.

pub mod coordinator;
pub mod driver;
pub mod selection;

pub use coordinator::{RefreshOutcome, SyncCoordinator, SyncView};
pub use driver::{DriverPhase, PollingDriver, DEFAULT_POLL_INTERVAL};
pub use selection::{
    LoadedFlags, Selection, DEFAULT_COIN, DEFAULT_CURRENCY, DEFAULT_HISTORY_WINDOW_DAYS,
};
