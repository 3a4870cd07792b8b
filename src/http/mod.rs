//! Transport layer: "send a GET, get raw bytes" as an injected capability.

#[cfg(feature = "http")]
pub mod client;

use crate::error::TransportError;
use async_trait::async_trait;
use std::time::Duration;

#[cfg(feature = "http")]
pub use client::HttpTransport;

/// Default connect timeout. The core adds no deadline on top of it.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Raw GET transport. Implementations never retry and never decode.
#[async_trait]
pub trait Transport: Send + Sync {
    /// GET `path` (relative to the API base, query included) and return the body.
    ///
    /// Non-2xx answers map to `TransportError::Status`.
    async fn get(&self, path: &str) -> Result<Vec<u8>, TransportError>;
}
