//! What the user is looking at: coin, quote currency and history window.

use crate::shared::{CoinId, CurrencyId};
use serde::{Deserialize, Serialize};

pub const DEFAULT_COIN: &str = "bitcoin";
pub const DEFAULT_CURRENCY: &str = "eur";
pub const DEFAULT_HISTORY_WINDOW_DAYS: u32 = 14;

/// The active coin/currency pair and how many days of history to show.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    pub coin: CoinId,
    pub currency: CurrencyId,
    pub history_window_days: u32,
}

impl Selection {
    pub fn new(
        coin: impl Into<CoinId>,
        currency: impl Into<CurrencyId>,
        history_window_days: u32,
    ) -> Self {
        Self {
            coin: coin.into(),
            currency: currency.into(),
            history_window_days,
        }
    }
}

impl Default for Selection {
    fn default() -> Self {
        Self::new(DEFAULT_COIN, DEFAULT_CURRENCY, DEFAULT_HISTORY_WINDOW_DAYS)
    }
}

/// Which collections have completed a fresh fetch since process start.
///
/// Never restored from the cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadedFlags {
    pub coins: bool,
    pub currencies: bool,
    pub history: bool,
}

impl LoadedFlags {
    pub fn all(&self) -> bool {
        self.coins && self.currencies && self.history
    }
}
