//! Models relating to messages within channels.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{ChannelId, GuildId, MessageId, UserId};
use super::user::PartialUser;
use super::utils;
use crate::cache::Entity;

/// A representation of a message over a channel.
///
/// The author is held as an id and resolved through the session's user cache;
/// the message never stores its own copy of the user.
#[derive(Clone, Debug, Default)]
pub struct Message {
    /// The unique Id of the message.
    pub id: MessageId,
    /// The Id of the channel that the message was sent to.
    pub channel_id: ChannelId,
    /// The Id of the user that sent the message.
    pub author_id: Option<UserId>,
    /// The content of the message. Preserved across partial updates that omit
    /// it, such as embed-resolution edits.
    pub content: String,
    /// The initial creation timestamp.
    pub timestamp: Option<DateTime<Utc>>,
    /// The timestamp of the last edit, if the message has been edited.
    pub edited_timestamp: Option<DateTime<Utc>>,
    /// An array of attached files.
    pub attachments: Vec<Attachment>,
    /// An array of embeds.
    pub embeds: Vec<Embed>,
    /// Indicator of whether the message is pinned in its channel.
    pub pinned: bool,
    /// Indicator of whether the message was sent with text-to-speech enabled.
    pub tts: bool,
    /// The message that this message is a reply to.
    pub reference: Option<MessageReference>,
}

/// A file uploaded with a message.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct Attachment {
    pub id: String,
    pub filename: String,
    pub url: String,
    /// The size of the file in bytes.
    pub size: u64,
}

/// Rich content embedded in a message, trimmed to the fields the dispatch
/// payloads reliably carry.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct Embed {
    pub title: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
}

/// A reference to another message, as carried on replies.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct MessageReference {
    pub channel_id: Option<ChannelId>,
    pub guild_id: Option<GuildId>,
    pub message_id: Option<MessageId>,
}

/// The fields of a message that a single payload may carry.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct PartialMessage {
    pub id: Option<MessageId>,
    pub channel_id: Option<ChannelId>,
    pub guild_id: Option<GuildId>,
    pub author: Option<PartialUser>,
    pub content: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "utils::double_option")]
    pub edited_timestamp: Option<Option<DateTime<Utc>>>,
    pub attachments: Option<Vec<Attachment>>,
    pub embeds: Option<Vec<Embed>>,
    pub pinned: Option<bool>,
    pub tts: Option<bool>,
    pub message_reference: Option<MessageReference>,
}

impl Entity for Message {
    type Context = ChannelId;
    type Id = MessageId;
    type Partial = PartialMessage;

    fn id(&self) -> MessageId {
        self.id
    }

    fn key_of(partial: &PartialMessage) -> Option<MessageId> {
        partial.id
    }

    fn from_partial(id: MessageId, partial: PartialMessage, channel_id: &ChannelId) -> Message {
        let mut message = Message {
            id,
            channel_id: partial.channel_id.unwrap_or(*channel_id),
            ..Default::default()
        };
        message.merge(partial);

        message
    }

    fn merge(&mut self, partial: PartialMessage) {
        if let Some(author) = &partial.author {
            if let Some(author_id) = author.id {
                self.author_id = Some(author_id);
            }
        }
        if let Some(content) = partial.content {
            self.content = content;
        }
        if let Some(timestamp) = partial.timestamp {
            self.timestamp = Some(timestamp);
        }
        if let Some(edited) = partial.edited_timestamp {
            self.edited_timestamp = edited;
        }
        if let Some(attachments) = partial.attachments {
            self.attachments = attachments;
        }
        if let Some(embeds) = partial.embeds {
            self.embeds = embeds;
        }
        if let Some(pinned) = partial.pinned {
            self.pinned = pinned;
        }
        if let Some(tts) = partial.tts {
            self.tts = tts;
        }
        if let Some(reference) = partial.message_reference {
            self.reference = Some(reference);
        }
    }
}

impl From<&Message> for MessageId {
    fn from(message: &Message) -> MessageId {
        message.id
    }
}
