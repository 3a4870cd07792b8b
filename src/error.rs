//! Unified error types.

use thiserror::Error;

/// Top-level error for every refresh and availability check.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Malformed {context} response: {source}")]
    MalformedResponse {
        context: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),
}

impl SyncError {
    pub(crate) fn malformed(context: &'static str) -> impl FnOnce(serde_json::Error) -> Self {
        move |source| SyncError::MalformedResponse { context, source }
    }

    /// HTTP status carried by a transport failure, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            SyncError::Transport(TransportError::Status { status, .. }) => Some(*status),
            _ => None,
        }
    }
}

/// Transport-layer errors. Never retried by the transport itself.
#[derive(Error, Debug)]
pub enum TransportError {
    #[cfg(feature = "http")]
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Server responded {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Connection failed: {0}")]
    Connection(String),
}

/// Durable snapshot errors.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Cache corrupted: {0}")]
    Corrupted(#[source] serde_json::Error),

    #[error("Cache unavailable: {0}")]
    Unavailable(#[from] std::io::Error),

    #[error("Snapshot serialization failed: {0}")]
    Serialize(#[source] serde_json::Error),
}
