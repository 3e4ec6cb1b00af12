//! Routing of inbound dispatch events into the cache and out to the handler.
//!
//! Every route follows the same shape: decode the payload, mutate the cache
//! under a write lock, drop the lock, then notify the [`EventHandler`]. Locks
//! are never held across an await point. Payloads missing the field that
//! anchors them in the entity graph are dropped with a debug log, never an
//! error; the gateway stream is best-effort by nature.

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::Client;
use crate::cache::{Entity, EntityCache};
use crate::model::prelude::*;

/// The identifying fields of a message deletion payload, which carries no
/// message body.
#[derive(Deserialize)]
struct MessageDeleteEvent {
    id: Option<MessageId>,
    channel_id: Option<ChannelId>,
}

impl Client {
    /// Routes a raw gateway dispatch frame by its event name.
    pub async fn dispatch_raw(&self, name: &str, data: Value) {
        self.dispatch(EventType::from_name(name), data).await;
    }

    /// Absorbs one dispatch event into the cache, then notifies the handler.
    pub async fn dispatch(&self, kind: EventType, data: Value) {
        match kind {
            EventType::Ready => self.ready(data).await,
            EventType::GuildCreate => self.guild_event(data, true).await,
            EventType::GuildUpdate => self.guild_event(data, false).await,
            EventType::GuildDelete => self.guild_delete(data).await,
            EventType::ChannelCreate => self.channel_event(data, true).await,
            EventType::ChannelUpdate => self.channel_event(data, false).await,
            EventType::ChannelDelete => self.channel_delete(data).await,
            EventType::MessageCreate => self.message_event(data, true).await,
            EventType::MessageUpdate => self.message_event(data, false).await,
            EventType::MessageDelete => self.message_delete(data).await,
            EventType::VoiceStateUpdate => self.voice_state_update(data).await,
            EventType::VoiceServerUpdate => self.voice_server_update(data),
            EventType::Other(name) => {
                debug!(event = %name, "ignoring unhandled dispatch event");
            },
        }
    }

    /// The session snapshot: everything cached so far is discarded and the
    /// model is rebuilt from the payload.
    async fn ready(&self, data: Value) {
        let ready: ReadyEvent = match serde_json::from_value(data) {
            Ok(ready) => ready,
            Err(why) => {
                debug!("dropping malformed ready payload: {why}");
                return;
            },
        };

        {
            let mut users = self.cache.users.write();
            *users = EntityCache::new();
            users.upsert(ready.user.clone(), &());
            // Hoist users carried inside guild member lists into the shared
            // user cache; the guilds themselves only keep ids.
            for guild in &ready.guilds {
                for member in guild.members.iter().flatten() {
                    if let Some(user) = member.user.clone() {
                        users.upsert(user, &());
                    }
                }
            }
        }

        *self.cache.current_user.write() = ready
            .user
            .id
            .map(|id| User::from_partial(id, ready.user.clone(), &()));

        {
            let mut guilds = self.cache.guilds.write();
            *guilds = EntityCache::new();
            for guild in ready.guilds.clone() {
                guilds.upsert(guild, &());
            }
        }

        if let Some(handler) = &self.event_handler {
            handler.ready(ready).await;
        }
    }

    async fn guild_event(&self, data: Value, created: bool) {
        let partial: PartialGuild = match serde_json::from_value(data) {
            Ok(partial) => partial,
            Err(why) => {
                debug!("dropping malformed guild payload: {why}");
                return;
            },
        };

        if let Some(members) = &partial.members {
            let mut users = self.cache.users.write();
            for member in members {
                if let Some(user) = member.user.clone() {
                    users.upsert(user, &());
                }
            }
        }

        let guild = {
            let mut guilds = self.cache.guilds.write();
            guilds.upsert(partial, &()).map(|guild| guild.clone())
        };

        let (Some(handler), Some(guild)) = (&self.event_handler, guild) else {
            return;
        };
        if created {
            handler.guild_create(guild).await;
        } else {
            handler.guild_update(guild).await;
        }
    }

    /// A guild deletion is two different events sharing a name: an outage
    /// (`unavailable: true`), which keeps the guild cached with its flag set,
    /// and an actual removal, which evicts it.
    async fn guild_delete(&self, data: Value) {
        let partial: PartialGuild = match serde_json::from_value(data) {
            Ok(partial) => partial,
            Err(why) => {
                debug!("dropping malformed guild payload: {why}");
                return;
            },
        };
        let Some(guild_id) = partial.id else {
            debug!("dropping guild delete without an id");
            return;
        };

        if partial.unavailable == Some(true) {
            self.cache.guilds.write().upsert(partial, &());
        } else {
            self.cache.guilds.write().remove(&guild_id);
        }

        if let Some(handler) = &self.event_handler {
            handler.guild_delete(guild_id).await;
        }
    }

    async fn channel_event(&self, data: Value, created: bool) {
        let partial: PartialChannel = match serde_json::from_value(data) {
            Ok(partial) => partial,
            Err(why) => {
                debug!("dropping malformed channel payload: {why}");
                return;
            },
        };

        // A channel lives inside its guild; without one the event has no home.
        let guild_id = partial.guild_id.or_else(|| {
            partial.id.and_then(|id| self.cache.guild_of_channel(id))
        });
        let Some(guild_id) = guild_id else {
            debug!("dropping channel event without a guild id");
            return;
        };

        let channel = {
            let mut guilds = self.cache.guilds.write();
            let Some(guild) = guilds.get_mut(&guild_id) else {
                debug!(%guild_id, "dropping channel event for an uncached guild");
                return;
            };

            guild.channels.upsert(partial, &guild_id).map(|channel| channel.clone())
        };

        let (Some(handler), Some(channel)) = (&self.event_handler, channel) else {
            return;
        };
        if created {
            handler.channel_create(channel).await;
        } else {
            handler.channel_update(channel).await;
        }
    }

    async fn channel_delete(&self, data: Value) {
        let partial: PartialChannel = match serde_json::from_value(data) {
            Ok(partial) => partial,
            Err(why) => {
                debug!("dropping malformed channel payload: {why}");
                return;
            },
        };
        let Some(channel_id) = partial.id else {
            debug!("dropping channel delete without an id");
            return;
        };

        let guild_id = partial
            .guild_id
            .or_else(|| self.cache.guild_of_channel(channel_id));
        if let Some(guild_id) = guild_id {
            let mut guilds = self.cache.guilds.write();
            if let Some(guild) = guilds.get_mut(&guild_id) {
                guild.channels.remove(&channel_id);
            }
        }

        if let Some(handler) = &self.event_handler {
            handler.channel_delete(channel_id).await;
        }
    }

    async fn message_event(&self, data: Value, created: bool) {
        let partial: PartialMessage = match serde_json::from_value(data) {
            Ok(partial) => partial,
            Err(why) => {
                debug!("dropping malformed message payload: {why}");
                return;
            },
        };
        let Some(channel_id) = partial.channel_id else {
            debug!("dropping message event without a channel id");
            return;
        };

        // The author rides along on the payload; it belongs in the shared
        // user cache, the message only keeps the id.
        if let Some(author) = partial.author.clone() {
            self.cache.users.write().upsert(author, &());
        }

        let max_messages = self.cache.settings().max_messages;
        let message = {
            let mut guilds = self.cache.guilds.write();
            let guild_id = partial.guild_id.or_else(|| {
                guilds
                    .values()
                    .find(|guild| guild.channels.contains(&channel_id))
                    .map(Guild::id)
            });
            let Some(channel) = guild_id
                .and_then(|guild_id| guilds.get_mut(&guild_id))
                .and_then(|guild| guild.channels.get_mut(&channel_id))
            else {
                debug!(%channel_id, "dropping message event for an uncached channel");
                return;
            };

            let message = channel
                .messages
                .upsert(partial, &channel_id)
                .map(|message| message.clone());
            while channel.messages.len() > max_messages {
                channel.messages.evict_oldest();
            }

            message
        };

        let (Some(handler), Some(message)) = (&self.event_handler, message) else {
            return;
        };
        if created {
            handler.message_create(message).await;
        } else {
            handler.message_update(message).await;
        }
    }

    async fn message_delete(&self, data: Value) {
        let event: MessageDeleteEvent = match serde_json::from_value(data) {
            Ok(event) => event,
            Err(why) => {
                debug!("dropping malformed message delete payload: {why}");
                return;
            },
        };
        let (Some(message_id), Some(channel_id)) = (event.id, event.channel_id) else {
            debug!("dropping message delete without an id or channel id");
            return;
        };

        {
            let mut guilds = self.cache.guilds.write();
            let guild_id = guilds
                .values()
                .find(|guild| guild.channels.contains(&channel_id))
                .map(Guild::id);
            if let Some(channel) = guild_id
                .and_then(|guild_id| guilds.get_mut(&guild_id))
                .and_then(|guild| guild.channels.get_mut(&channel_id))
            {
                channel.messages.remove(&message_id);
            }
        }

        if let Some(handler) = &self.event_handler {
            handler.message_delete(channel_id, message_id).await;
        }
    }

    /// A voice state update takes two routes: the raw payload goes to the
    /// voice bridge for the guild's registered adapter, and a typed copy is
    /// merged into the guild's voice state collection.
    async fn voice_state_update(&self, data: Value) {
        if let Some(bridge) = self.voice_bridge() {
            bridge.dispatch_voice_state_update(&data);
        }

        let partial: PartialVoiceState = match serde_json::from_value(data) {
            Ok(partial) => partial,
            Err(why) => {
                debug!("dropping malformed voice state payload: {why}");
                return;
            },
        };
        let Some(guild_id) = partial.guild_id else {
            debug!("dropping voice state update without a guild id");
            return;
        };

        let state = {
            let mut guilds = self.cache.guilds.write();
            let Some(guild) = guilds.get_mut(&guild_id) else {
                debug!(%guild_id, "dropping voice state update for an uncached guild");
                return;
            };

            guild.update_voice_state(partial)
        };

        if let Some(handler) = &self.event_handler {
            handler.voice_state_update(guild_id, state).await;
        }
    }

    /// A voice server update only concerns the external voice transport; the
    /// cache holds nothing derived from it.
    fn voice_server_update(&self, data: Value) {
        if let Some(bridge) = self.voice_bridge() {
            bridge.dispatch_voice_server_update(&data);
        }
    }
}
