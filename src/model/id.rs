//! A collection of newtypes defining type-strong IDs.
//!
//! Every entity is identified by a snowflake: an opaque, time-ordered `u64`
//! that the API serializes as a string. The creation instant of an entity is
//! recoverable from its id alone, so all of these types expose
//! [`created_at`](UserId::created_at).

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::de::{Error as DeError, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::constants::DISCORD_EPOCH;

pub(crate) fn snowflake_timestamp(id: u64) -> DateTime<Utc> {
    let ms = (id >> 22) + DISCORD_EPOCH;
    DateTime::from_timestamp_millis(ms as i64).unwrap_or_default()
}

struct SnowflakeVisitor;

impl<'de> Visitor<'de> for SnowflakeVisitor {
    type Value = u64;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a snowflake id as a string or integer")
    }

    fn visit_u64<E: DeError>(self, value: u64) -> Result<Self::Value, E> {
        Ok(value)
    }

    fn visit_str<E: DeError>(self, value: &str) -> Result<Self::Value, E> {
        value.parse().map_err(DeError::custom)
    }
}

macro_rules! id_u64 {
    ($($name:ident;)*) => {
        $(
            impl $name {
                /// Creates a new id from a `u64`.
                #[must_use]
                pub const fn new(id: u64) -> Self {
                    Self(id)
                }

                /// Retrieves the inner `u64`.
                #[must_use]
                pub const fn get(self) -> u64 {
                    self.0
                }

                /// Retrieves the time that the id was created at.
                #[must_use]
                pub fn created_at(&self) -> DateTime<Utc> {
                    snowflake_timestamp(self.0)
                }
            }

            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    fmt::Display::fmt(&self.0, f)
                }
            }

            impl From<u64> for $name {
                fn from(id: u64) -> $name {
                    $name(id)
                }
            }

            impl From<$name> for u64 {
                fn from(id: $name) -> u64 {
                    id.0
                }
            }

            impl FromStr for $name {
                type Err = std::num::ParseIntError;

                fn from_str(s: &str) -> Result<Self, Self::Err> {
                    s.parse().map($name)
                }
            }

            impl Serialize for $name {
                fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                    serializer.collect_str(&self.0)
                }
            }

            impl<'de> Deserialize<'de> for $name {
                fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                    deserializer.deserialize_any(SnowflakeVisitor).map($name)
                }
            }
        )*
    };
}

/// An identifier for a User.
#[derive(Copy, Clone, Default, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub struct UserId(pub u64);

/// An identifier for a Guild.
#[derive(Copy, Clone, Default, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub struct GuildId(pub u64);

/// An identifier for a Channel.
#[derive(Copy, Clone, Default, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub struct ChannelId(pub u64);

/// An identifier for a Message.
#[derive(Copy, Clone, Default, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub struct MessageId(pub u64);

id_u64! {
    UserId;
    GuildId;
    ChannelId;
    MessageId;
}
