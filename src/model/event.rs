//! Gateway dispatch event kinds and the bulk-ready payload.

use serde::Deserialize;

use super::guild::PartialGuild;
use super::user::PartialUser;

/// The kind of a dispatch event, mapped from the `t` field of a gateway frame.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub enum EventType {
    Ready,
    GuildCreate,
    GuildUpdate,
    GuildDelete,
    ChannelCreate,
    ChannelUpdate,
    ChannelDelete,
    MessageCreate,
    MessageUpdate,
    MessageDelete,
    VoiceStateUpdate,
    VoiceServerUpdate,
    /// An event name this library does not handle.
    Other(String),
}

impl EventType {
    #[must_use]
    pub fn from_name(name: &str) -> EventType {
        match name {
            "READY" => EventType::Ready,
            "GUILD_CREATE" => EventType::GuildCreate,
            "GUILD_UPDATE" => EventType::GuildUpdate,
            "GUILD_DELETE" => EventType::GuildDelete,
            "CHANNEL_CREATE" => EventType::ChannelCreate,
            "CHANNEL_UPDATE" => EventType::ChannelUpdate,
            "CHANNEL_DELETE" => EventType::ChannelDelete,
            "MESSAGE_CREATE" => EventType::MessageCreate,
            "MESSAGE_UPDATE" => EventType::MessageUpdate,
            "MESSAGE_DELETE" => EventType::MessageDelete,
            "VOICE_STATE_UPDATE" => EventType::VoiceStateUpdate,
            "VOICE_SERVER_UPDATE" => EventType::VoiceServerUpdate,
            other => EventType::Other(other.to_owned()),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            EventType::Ready => "READY",
            EventType::GuildCreate => "GUILD_CREATE",
            EventType::GuildUpdate => "GUILD_UPDATE",
            EventType::GuildDelete => "GUILD_DELETE",
            EventType::ChannelCreate => "CHANNEL_CREATE",
            EventType::ChannelUpdate => "CHANNEL_UPDATE",
            EventType::ChannelDelete => "CHANNEL_DELETE",
            EventType::MessageCreate => "MESSAGE_CREATE",
            EventType::MessageUpdate => "MESSAGE_UPDATE",
            EventType::MessageDelete => "MESSAGE_DELETE",
            EventType::VoiceStateUpdate => "VOICE_STATE_UPDATE",
            EventType::VoiceServerUpdate => "VOICE_SERVER_UPDATE",
            EventType::Other(name) => name,
        }
    }
}

/// The initial bulk snapshot, sent once per session. The entire model is
/// rebuilt from this payload; nothing survives from a previous session.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ReadyEvent {
    pub user: PartialUser,
    pub session_id: Option<String>,
    #[serde(default)]
    pub guilds: Vec<PartialGuild>,
}
