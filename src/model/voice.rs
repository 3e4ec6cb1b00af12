//! Representations of voice information.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::id::{ChannelId, GuildId, UserId};
use super::utils;

/// A user's state within a guild's voice channels.
///
/// States are keyed by user id within their guild. A state only exists while
/// the user is connected somewhere: leaving voice removes the entry from the
/// guild outright rather than leaving one behind with a null channel.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VoiceState {
    pub user_id: UserId,
    /// The voice channel the user is connected to.
    pub channel_id: Option<ChannelId>,
    pub session_id: Option<String>,
    /// Whether the user has been deafened by the server.
    pub deaf: bool,
    /// Whether the user has been muted by the server.
    pub mute: bool,
    pub self_deaf: bool,
    pub self_mute: bool,
    pub self_video: bool,
    pub self_stream: bool,
    /// Whether the user's permission to speak is denied, e.g. in a stage
    /// channel audience.
    pub suppress: bool,
    /// When the user asked to speak in a stage channel.
    pub request_to_speak_timestamp: Option<DateTime<Utc>>,
}

/// A raw voice-state payload, as carried by both guild snapshots and
/// incremental `VOICE_STATE_UPDATE` events.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct PartialVoiceState {
    pub guild_id: Option<GuildId>,
    /// Double-wrapped: the update path must distinguish "no change" (absent)
    /// from "left voice" (explicit null).
    #[serde(default, deserialize_with = "utils::double_option")]
    pub channel_id: Option<Option<ChannelId>>,
    pub user_id: Option<UserId>,
    pub session_id: Option<String>,
    pub deaf: Option<bool>,
    pub mute: Option<bool>,
    pub self_deaf: Option<bool>,
    pub self_mute: Option<bool>,
    pub self_video: Option<bool>,
    pub self_stream: Option<bool>,
    pub suppress: Option<bool>,
    #[serde(default, deserialize_with = "utils::double_option")]
    pub request_to_speak_timestamp: Option<Option<DateTime<Utc>>>,
}

impl VoiceState {
    pub(crate) fn new(user_id: UserId) -> VoiceState {
        VoiceState {
            user_id,
            ..Default::default()
        }
    }

    /// Merges the fields carried by `partial` into this state, leaving absent
    /// fields untouched.
    pub fn merge(&mut self, partial: PartialVoiceState) {
        if let Some(user_id) = partial.user_id {
            self.user_id = user_id;
        }
        if let Some(channel_id) = partial.channel_id {
            self.channel_id = channel_id;
        }
        if let Some(session_id) = partial.session_id {
            self.session_id = Some(session_id);
        }
        if let Some(deaf) = partial.deaf {
            self.deaf = deaf;
        }
        if let Some(mute) = partial.mute {
            self.mute = mute;
        }
        if let Some(self_deaf) = partial.self_deaf {
            self.self_deaf = self_deaf;
        }
        if let Some(self_mute) = partial.self_mute {
            self.self_mute = self_mute;
        }
        if let Some(self_video) = partial.self_video {
            self.self_video = self_video;
        }
        if let Some(self_stream) = partial.self_stream {
            self.self_stream = self_stream;
        }
        if let Some(suppress) = partial.suppress {
            self.suppress = suppress;
        }
        if let Some(ts) = partial.request_to_speak_timestamp {
            self.request_to_speak_timestamp = ts;
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn absent_and_null_channel_ids_deserialize_apart() {
        let absent: PartialVoiceState = serde_json::from_value(json!({"user_id": "1"})).unwrap();
        assert_eq!(absent.channel_id, None);

        let null: PartialVoiceState =
            serde_json::from_value(json!({"user_id": "1", "channel_id": null})).unwrap();
        assert_eq!(null.channel_id, Some(None));

        let set: PartialVoiceState =
            serde_json::from_value(json!({"user_id": "1", "channel_id": "5"})).unwrap();
        assert_eq!(set.channel_id, Some(Some(ChannelId::new(5))));
    }

    #[test]
    fn merge_keeps_absent_flags() {
        let mut state = VoiceState::new(UserId::new(1));
        state.merge(serde_json::from_value(json!({"self_mute": true, "session_id": "abc"})).unwrap());
        state.merge(serde_json::from_value(json!({"self_deaf": true})).unwrap());

        assert!(state.self_mute);
        assert!(state.self_deaf);
        assert_eq!(state.session_id.as_deref(), Some("abc"));
    }
}
