//! Models for guilds, the aggregate root of the entity graph.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::debug;

use super::channel::{Channel, PartialChannel};
use super::id::{GuildId, UserId};
use super::user::PartialUser;
use super::utils;
use super::voice::{PartialVoiceState, VoiceState};
use crate::cache::{Entity, EntityCache};
use crate::constants::CDN_BASE;

/// Information about a guild, composed of the fields the gateway keeps
/// up to date plus the child collections the guild owns: its channels and the
/// voice states of connected users.
#[derive(Clone, Debug)]
pub struct Guild {
    /// The unique Id identifying the guild.
    pub id: GuildId,
    /// The name of the guild.
    pub name: String,
    /// The hash of the icon used by the guild.
    pub icon: Option<String>,
    /// The Id of the user who owns the guild.
    pub owner_id: Option<UserId>,
    /// The number of members in the guild.
    pub member_count: Option<u64>,
    /// Indicator of whether the guild is unavailable due to an outage.
    ///
    /// While set, every merge other than the flag flipping back is a no-op;
    /// the stale fields are kept as-is until the guild comes back.
    pub unavailable: bool,
    /// All of the guild's channels, in the order first seen.
    pub channels: EntityCache<Channel>,
    /// Users who are currently in a voice channel, keyed by user id.
    pub voice_states: HashMap<UserId, VoiceState>,
    /// Members known from snapshot payloads, keyed by user id. Member chunking
    /// is not performed, so this is not guaranteed to be complete.
    pub members: HashMap<UserId, PartialMember>,
}

/// A member payload as carried inside guild snapshots.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct PartialMember {
    pub user: Option<PartialUser>,
    pub nick: Option<String>,
    pub joined_at: Option<DateTime<Utc>>,
}

/// The fields of a guild that a single payload may carry.
///
/// Snapshot payloads (guild creation) additionally include the `channels`,
/// `voice_states` and `members` collections; incremental updates never do.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct PartialGuild {
    pub id: Option<GuildId>,
    pub name: Option<String>,
    #[serde(default, deserialize_with = "utils::double_option")]
    pub icon: Option<Option<String>>,
    pub owner_id: Option<UserId>,
    pub member_count: Option<u64>,
    pub unavailable: Option<bool>,
    pub channels: Option<Vec<PartialChannel>>,
    pub voice_states: Option<Vec<PartialVoiceState>>,
    pub members: Option<Vec<PartialMember>>,
}

impl Guild {
    /// Returns the formatted URL of the guild's icon, if the guild has one.
    pub fn icon_url(&self) -> Option<String> {
        self.icon.as_ref().map(|hash| {
            let ext = if hash.starts_with("a_") { "gif" } else { "webp" };

            format!("{CDN_BASE}/icons/{}/{hash}.{ext}?size=1024", self.id)
        })
    }

    /// Applies an incremental voice-state update to this guild.
    ///
    /// Unlike the snapshot path in [`merge`](Entity::merge), which replaces
    /// the collection wholesale, this merges a single user's state in place.
    /// An explicit null channel id means the user left voice in this guild,
    /// and removes their entry outright. Events without a user id, or scoped
    /// to a different guild, are ignored.
    ///
    /// Returns the state after the update, or `None` if the user is no longer
    /// (or was never) tracked.
    pub fn update_voice_state(&mut self, partial: PartialVoiceState) -> Option<VoiceState> {
        let user_id = match partial.user_id {
            Some(user_id) => user_id,
            None => {
                debug!("dropping voice state update without a user id");
                return None;
            },
        };

        if partial.guild_id.is_some_and(|guild_id| guild_id != self.id) {
            return None;
        }

        if partial.channel_id == Some(None) {
            self.voice_states.remove(&user_id);
            return None;
        }

        let state = self
            .voice_states
            .entry(user_id)
            .or_insert_with(|| VoiceState::new(user_id));
        state.merge(partial);

        Some(state.clone())
    }
}

impl Entity for Guild {
    type Context = ();
    type Id = GuildId;
    type Partial = PartialGuild;

    fn id(&self) -> GuildId {
        self.id
    }

    fn key_of(partial: &PartialGuild) -> Option<GuildId> {
        partial.id
    }

    fn from_partial(id: GuildId, partial: PartialGuild, _ctx: &()) -> Guild {
        let mut guild = Guild {
            id,
            name: String::new(),
            icon: None,
            owner_id: None,
            member_count: None,
            unavailable: false,
            channels: EntityCache::new(),
            voice_states: HashMap::new(),
            members: HashMap::new(),
        };
        guild.merge(partial);

        guild
    }

    fn merge(&mut self, partial: PartialGuild) {
        // Outage payloads carry nothing but the flag; everything else in them
        // is ignored, as is every later merge until the guild comes back.
        if partial.unavailable == Some(true) {
            self.unavailable = true;
            return;
        }
        if self.unavailable {
            if partial.unavailable != Some(false) {
                return;
            }
            self.unavailable = false;
        }

        if let Some(name) = partial.name {
            self.name = name;
        }
        if let Some(icon) = partial.icon {
            self.icon = icon;
        }
        if let Some(owner_id) = partial.owner_id {
            self.owner_id = Some(owner_id);
        }
        if let Some(member_count) = partial.member_count {
            self.member_count = Some(member_count);
        }

        if let Some(channels) = partial.channels {
            for channel in channels {
                self.channels.upsert(channel, &self.id);
            }
        }

        if let Some(states) = partial.voice_states {
            // Snapshots are authoritative for who is in voice: anyone absent
            // from the payload left while we were away.
            self.voice_states.clear();
            for state in states {
                if let Some(user_id) = state.user_id {
                    let entry = self
                        .voice_states
                        .entry(user_id)
                        .or_insert_with(|| VoiceState::new(user_id));
                    entry.merge(state);
                }
            }
        }

        if let Some(members) = partial.members {
            for member in members {
                if let Some(user_id) = member.user.as_ref().and_then(|user| user.id) {
                    self.members.insert(user_id, member);
                }
            }
        }
    }
}

impl From<&Guild> for GuildId {
    fn from(guild: &Guild) -> GuildId {
        guild.id
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::model::id::ChannelId;

    fn guild(value: serde_json::Value) -> Guild {
        let partial: PartialGuild = serde_json::from_value(value).unwrap();
        let id = Guild::key_of(&partial).unwrap();

        Guild::from_partial(id, partial, &())
    }

    fn partial(value: serde_json::Value) -> PartialGuild {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn unavailable_guilds_ignore_merges() {
        let mut g = guild(json!({"id": "1", "name": "a"}));

        g.merge(partial(json!({"id": "1", "unavailable": true, "name": "ignored"})));
        assert!(g.unavailable);
        assert_eq!(g.name, "a");

        // Arbitrarily many merges without an explicit `unavailable: false`
        // leave every field untouched.
        for _ in 0..3 {
            g.merge(partial(json!({"id": "1", "name": "still ignored"})));
            assert_eq!(g.name, "a");
        }

        g.merge(partial(json!({"id": "1", "unavailable": false, "name": "b"})));
        assert!(!g.unavailable);
        assert_eq!(g.name, "b");
    }

    #[test]
    fn snapshot_repopulates_children() {
        let mut g = guild(json!({
            "id": "1",
            "name": "a",
            "channels": [{"id": "10", "type": 0, "name": "general"}],
            "voice_states": [{"user_id": "7", "channel_id": "11", "session_id": "s1"}],
        }));

        // Children missing a guild id get stamped with the aggregate's.
        let ch = g.channels.get(&ChannelId::new(10)).unwrap();
        assert_eq!(ch.guild_id, Some(GuildId::new(1)));
        assert_eq!(g.voice_states.len(), 1);

        // A later snapshot replaces the voice states wholesale but merges
        // channels in place.
        g.merge(partial(json!({
            "id": "1",
            "channels": [{"id": "10", "type": 0, "name": "renamed"}],
            "voice_states": [{"user_id": "8", "channel_id": "11"}],
        })));

        assert_eq!(g.channels.len(), 1);
        assert_eq!(g.channels.get(&ChannelId::new(10)).unwrap().name.as_deref(), Some("renamed"));
        assert!(!g.voice_states.contains_key(&UserId::new(7)));
        assert!(g.voice_states.contains_key(&UserId::new(8)));
    }

    #[test]
    fn leaving_voice_removes_the_state() {
        let mut g = guild(json!({"id": "1"}));

        g.update_voice_state(
            serde_json::from_value(json!({"guild_id": "1", "user_id": "7", "channel_id": "11"}))
                .unwrap(),
        );
        assert!(g.voice_states.contains_key(&UserId::new(7)));

        g.update_voice_state(
            serde_json::from_value(json!({"guild_id": "1", "user_id": "7", "channel_id": null}))
                .unwrap(),
        );
        // Removed outright, not present-with-null.
        assert!(!g.voice_states.contains_key(&UserId::new(7)));
    }

    #[test]
    fn foreign_and_anonymous_voice_updates_are_ignored() {
        let mut g = guild(json!({"id": "1"}));

        let foreign = serde_json::from_value(
            json!({"guild_id": "2", "user_id": "7", "channel_id": "11"}),
        )
        .unwrap();
        assert!(g.update_voice_state(foreign).is_none());
        assert!(g.voice_states.is_empty());

        let anonymous = serde_json::from_value(json!({"guild_id": "1", "channel_id": "11"})).unwrap();
        assert!(g.update_voice_state(anonymous).is_none());
        assert!(g.voice_states.is_empty());
    }

    #[test]
    fn incremental_voice_update_merges_in_place() {
        let mut g = guild(json!({"id": "1"}));

        g.update_voice_state(
            serde_json::from_value(
                json!({"guild_id": "1", "user_id": "7", "channel_id": "11", "self_mute": true}),
            )
            .unwrap(),
        );
        let state = g
            .update_voice_state(
                serde_json::from_value(json!({"guild_id": "1", "user_id": "7", "self_deaf": true}))
                    .unwrap(),
            )
            .unwrap();

        assert_eq!(state.channel_id, Some(ChannelId::new(11)));
        assert!(state.self_mute);
        assert!(state.self_deaf);
    }
}
