//! Rate history state container: owned by the coordinator, update logic here.

use super::ConversionRate;

/// Rates for the current selection, newest first.
///
/// Index 0 is the live slot: a historical refresh fills the list sorted by
/// descending timestamp, and each live quote overwrites the first entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RateHistory {
    rates: Vec<ConversionRate>,
}

impl RateHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adopt rates verbatim (e.g. restored from the cache).
    pub fn from_rates(rates: Vec<ConversionRate>) -> Self {
        Self { rates }
    }

    /// Replace all rates with a historical fetch, sorted newest first.
    pub fn replace_history(&mut self, mut rates: Vec<ConversionRate>) {
        rates.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        self.rates = rates;
    }

    /// Merge a live quote: overwrite index 0, or append to an empty list.
    pub fn merge_current(&mut self, rate: ConversionRate) {
        match self.rates.first_mut() {
            Some(first) => *first = rate,
            None => self.rates.push(rate),
        }
    }

    pub fn rates(&self) -> &[ConversionRate] {
        &self.rates
    }

    pub fn latest(&self) -> Option<&ConversionRate> {
        self.rates.first()
    }

    pub fn clear(&mut self) {
        self.rates.clear();
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    pub fn to_vec(&self) -> Vec<ConversionRate> {
        self.rates.clone()
    }
}
