//! Serde helper for patch fields that distinguish "absent" from "null".

use serde::{Deserialize, Deserializer};

/// Deserialize a present field (including an explicit `null`) as `Some(..)`.
///
/// Combined with `#[serde(default)]`, an absent field stays `None`, `null`
/// becomes `Some(None)` (clear), and a value becomes `Some(Some(v))`.
pub fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
