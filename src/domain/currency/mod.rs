//! Currency domain: quote currencies a coin can be priced in.

use crate::error::SyncError;
use crate::shared::CurrencyId;
use serde::{Deserialize, Serialize};

/// A quote currency supported by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Currency {
    pub id: CurrencyId,
}

impl Currency {
    pub fn new(id: impl Into<CurrencyId>) -> Self {
        Self { id: id.into() }
    }
}

/// Decode a `/simple/supported_vs_currencies` body: a flat array of strings.
pub fn decode_currency_list(bytes: &[u8]) -> Result<Vec<Currency>, SyncError> {
    let ids: Vec<CurrencyId> =
        serde_json::from_slice(bytes).map_err(SyncError::malformed("currency list"))?;
    Ok(ids.into_iter().map(|id| Currency { id }).collect())
}
