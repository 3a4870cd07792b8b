//! Coin domain: selectable coin identifiers.

pub mod wire;

use crate::error::SyncError;
use crate::shared::CoinId;
use serde::{Deserialize, Serialize};

/// A coin the backend can quote.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coin {
    pub id: CoinId,
}

impl Coin {
    pub fn new(id: impl Into<CoinId>) -> Self {
        Self { id: id.into() }
    }
}

impl From<wire::CoinEntry> for Coin {
    fn from(entry: wire::CoinEntry) -> Self {
        Self { id: entry.id }
    }
}

/// Decode a `/coins/list` body. Source order and duplicates are kept.
pub fn decode_coin_list(bytes: &[u8]) -> Result<Vec<Coin>, SyncError> {
    let entries: Vec<wire::CoinEntry> =
        serde_json::from_slice(bytes).map_err(SyncError::malformed("coin list"))?;
    Ok(entries.into_iter().map(Coin::from).collect())
}
