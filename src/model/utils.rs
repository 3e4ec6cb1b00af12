//! Deserialization helpers for the quirks of dispatch payloads.

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer};

/// Used with `#[serde(default, deserialize_with = "double_option")]` on fields
/// where "absent" and "explicitly null" mean different things: the outer
/// `Option` tracks presence, the inner one nullability.
pub(crate) fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

/// The API serializes discriminators as zero-padded strings, though older
/// payloads carried plain integers.
pub(crate) fn discriminator<'de, D>(deserializer: D) -> Result<Option<u16>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Discriminator {
        Num(u16),
        Str(String),
    }

    match Option::<Discriminator>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Discriminator::Num(num)) => Ok(Some(num)),
        Some(Discriminator::Str(s)) => s.parse().map(Some).map_err(DeError::custom),
    }
}
