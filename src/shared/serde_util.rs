//! Custom serde helpers for backend wire formats.
//!
//! CoinGecko payloads are decoded positionally: object keys are consumed
//! without checking their names and values are read in the order the backend
//! documents. Anything beyond the documented shape is a decode error.

use serde::de::{self, Deserialize, IgnoredAny, MapAccess, SeqAccess};

/// Skips the next key and decodes its value.
pub(crate) fn next_value_positional<'de, A, T>(map: &mut A, what: &str) -> Result<T, A::Error>
where
    A: MapAccess<'de>,
    T: Deserialize<'de>,
{
    match map.next_key::<IgnoredAny>()? {
        Some(_) => map.next_value(),
        None => Err(de::Error::custom(format!("missing {}", what))),
    }
}

/// Reads the next key as a string and decodes its value.
pub(crate) fn next_entry_positional<'de, A, T>(
    map: &mut A,
    what: &str,
) -> Result<(String, T), A::Error>
where
    A: MapAccess<'de>,
    T: Deserialize<'de>,
{
    map.next_entry::<String, T>()?
        .ok_or_else(|| de::Error::custom(format!("missing {}", what)))
}

/// Fails if the object has entries left.
pub(crate) fn end_of_map<'de, A>(map: &mut A, what: &str) -> Result<(), A::Error>
where
    A: MapAccess<'de>,
{
    match map.next_key::<IgnoredAny>()? {
        Some(_) => Err(de::Error::custom(format!("unexpected field after {}", what))),
        None => Ok(()),
    }
}

/// Decodes the next array element, failing if the array has ended.
pub(crate) fn next_element_required<'de, A, T>(seq: &mut A, what: &str) -> Result<T, A::Error>
where
    A: SeqAccess<'de>,
    T: Deserialize<'de>,
{
    seq.next_element::<T>()?
        .ok_or_else(|| de::Error::custom(format!("missing {}", what)))
}

/// Fails if the array has elements left.
pub(crate) fn end_of_seq<'de, A>(seq: &mut A, what: &str) -> Result<(), A::Error>
where
    A: SeqAccess<'de>,
{
    match seq.next_element::<IgnoredAny>()? {
        Some(_) => Err(de::Error::custom(format!("unexpected element after {}", what))),
        None => Ok(()),
    }
}
