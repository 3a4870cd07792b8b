//! Wire types for the coin list response.

use crate::shared::serde_util::{end_of_map, next_value_positional};
use crate::shared::CoinId;
use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};
use std::fmt;

/// One `/coins/list` element: `{"id": .., "symbol": .., "name": ..}`.
///
/// Symbol and name are read (they must be strings) and then dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct CoinEntry {
    pub id: CoinId,
}

impl<'de> Deserialize<'de> for CoinEntry {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct EntryVisitor;

        impl<'de> Visitor<'de> for EntryVisitor {
            type Value = CoinEntry;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a coin object with id, symbol and name")
            }

            fn visit_map<A>(self, mut map: A) -> Result<CoinEntry, A::Error>
            where
                A: MapAccess<'de>,
            {
                let id: CoinId = next_value_positional(&mut map, "coin id")?;
                let _symbol: String = next_value_positional(&mut map, "coin symbol")?;
                let _name: String = next_value_positional(&mut map, "coin name")?;
                end_of_map(&mut map, "coin name")?;
                Ok(CoinEntry { id })
            }
        }

        deserializer.deserialize_map(EntryVisitor)
    }
}
