use async_trait::async_trait;

use crate::model::prelude::*;

/// The core trait for handling dispatch events, notified after the cache has
/// absorbed the corresponding payload.
///
/// Every method has a no-op default implementation, so implementors only
/// override the events they care about. Entities are handed over by value,
/// cloned out of the cache; to observe later state, resolve the id through
/// the cache again.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Dispatched upon startup, once the session snapshot has replaced the
    /// cache contents.
    async fn ready(&self, _ready: ReadyEvent) {}

    /// Dispatched when a guild is created, or becomes available again.
    async fn guild_create(&self, _guild: Guild) {}

    /// Dispatched when a guild's fields are updated.
    async fn guild_update(&self, _guild: Guild) {}

    /// Dispatched when the session leaves a guild, or the guild becomes
    /// unavailable.
    async fn guild_delete(&self, _guild_id: GuildId) {}

    /// Dispatched when a channel is created.
    async fn channel_create(&self, _channel: Channel) {}

    /// Dispatched when a channel is updated.
    async fn channel_update(&self, _channel: Channel) {}

    /// Dispatched when a channel is deleted.
    async fn channel_delete(&self, _channel_id: ChannelId) {}

    /// Dispatched when a message is sent.
    async fn message_create(&self, _message: Message) {}

    /// Dispatched when a message is edited.
    async fn message_update(&self, _message: Message) {}

    /// Dispatched when a message is deleted.
    async fn message_delete(&self, _channel_id: ChannelId, _message_id: MessageId) {}

    /// Dispatched when a user joins, moves within, or leaves voice in a guild.
    ///
    /// `state` is the user's state after the update; `None` means they left
    /// voice in that guild.
    async fn voice_state_update(&self, _guild_id: GuildId, _state: Option<VoiceState>) {}
}
