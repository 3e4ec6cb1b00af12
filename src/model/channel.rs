//! Models relating to channels.

use serde::Deserialize;

use super::id::{ChannelId, GuildId};
use super::message::Message;
use crate::cache::{Entity, EntityCache};

/// A representation of each available channel kind, derived from the numeric
/// type code carried on channel payloads.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum ChannelType {
    /// An indicator that the channel is a text channel in a guild.
    Text,
    /// An indicator that the channel is a direct message channel.
    Private,
    /// An indicator that the channel is a voice channel in a guild.
    Voice,
    /// An indicator that the channel is a group direct message channel.
    GroupDm,
    /// An indicator that the channel is a channel category.
    Category,
    /// An indicator that the channel is an announcement channel.
    News,
    /// An indicator that the channel is a thread under an announcement channel.
    NewsThread,
    /// An indicator that the channel is a public thread.
    PublicThread,
    /// An indicator that the channel is a private thread.
    PrivateThread,
    /// An indicator that the channel is a stage voice channel.
    Stage,
    /// A type code this library does not know about.
    Unknown(u8),
}

impl ChannelType {
    #[must_use]
    pub fn from_code(code: u8) -> ChannelType {
        match code {
            0 => ChannelType::Text,
            1 => ChannelType::Private,
            2 => ChannelType::Voice,
            3 => ChannelType::GroupDm,
            4 => ChannelType::Category,
            5 => ChannelType::News,
            10 => ChannelType::NewsThread,
            11 => ChannelType::PublicThread,
            12 => ChannelType::PrivateThread,
            13 => ChannelType::Stage,
            other => ChannelType::Unknown(other),
        }
    }

    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            ChannelType::Text => 0,
            ChannelType::Private => 1,
            ChannelType::Voice => 2,
            ChannelType::GroupDm => 3,
            ChannelType::Category => 4,
            ChannelType::News => 5,
            ChannelType::NewsThread => 10,
            ChannelType::PublicThread => 11,
            ChannelType::PrivateThread => 12,
            ChannelType::Stage => 13,
            ChannelType::Unknown(code) => code,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            ChannelType::Text => "text",
            ChannelType::Private => "private",
            ChannelType::Voice => "voice",
            ChannelType::GroupDm => "group",
            ChannelType::Category => "category",
            ChannelType::News => "news",
            ChannelType::NewsThread => "news_thread",
            ChannelType::PublicThread => "public_thread",
            ChannelType::PrivateThread => "private_thread",
            ChannelType::Stage => "stage",
            ChannelType::Unknown(_) => "unknown",
        }
    }
}

/// A channel within a guild.
///
/// The channel exclusively owns its message cache; the link back to the guild
/// is an id, never a pointer, since a channel does not own its guild.
#[derive(Clone, Debug)]
pub struct Channel {
    /// The unique Id of the channel.
    pub id: ChannelId,
    /// The Id of the guild the channel is located in, when known.
    pub guild_id: Option<GuildId>,
    /// The kind of the channel, recomputed from the numeric type code on every
    /// merge.
    pub kind: ChannelType,
    /// The name of the channel.
    pub name: Option<String>,
    /// The messages seen in this channel, oldest first.
    pub messages: EntityCache<Message>,
}

/// The fields of a channel that a single payload may carry.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct PartialChannel {
    pub id: Option<ChannelId>,
    pub guild_id: Option<GuildId>,
    #[serde(rename = "type")]
    pub kind: Option<u8>,
    pub name: Option<String>,
}

impl Entity for Channel {
    type Context = GuildId;
    type Id = ChannelId;
    type Partial = PartialChannel;

    fn id(&self) -> ChannelId {
        self.id
    }

    fn key_of(partial: &PartialChannel) -> Option<ChannelId> {
        partial.id
    }

    fn from_partial(id: ChannelId, partial: PartialChannel, guild_id: &GuildId) -> Channel {
        let mut channel = Channel {
            id,
            // Snapshot children may omit their guild id; stamp the owner's.
            guild_id: Some(*guild_id),
            kind: ChannelType::Unknown(u8::MAX),
            name: None,
            messages: EntityCache::new(),
        };
        channel.merge(partial);

        channel
    }

    fn merge(&mut self, partial: PartialChannel) {
        if let Some(guild_id) = partial.guild_id {
            self.guild_id = Some(guild_id);
        }
        if let Some(code) = partial.kind {
            self.kind = ChannelType::from_code(code);
        }
        if let Some(name) = partial.name {
            self.name = Some(name);
        }
    }
}

impl From<&Channel> for ChannelId {
    fn from(channel: &Channel) -> ChannelId {
        channel.id
    }
}
