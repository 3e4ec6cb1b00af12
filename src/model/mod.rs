//! Mappings of objects received from the API, including the entities kept
//! up to date by the cache and the partial payloads they merge from.
//!
//! Entities are long-lived: once one exists in a cache, later payloads for the
//! same id are merged into the existing value rather than replacing it, so
//! fields a payload omits are never lost.

pub mod channel;
pub mod event;
pub mod guild;
pub mod id;
pub mod message;
pub mod user;
pub mod voice;

mod utils;

pub mod prelude {
    //! The model prelude re-exports all model types.

    pub use super::channel::{Channel, ChannelType, PartialChannel};
    pub use super::event::{EventType, ReadyEvent};
    pub use super::guild::{Guild, PartialGuild, PartialMember};
    pub use super::id::{ChannelId, GuildId, MessageId, UserId};
    pub use super::message::{Attachment, Embed, Message, MessageReference, PartialMessage};
    pub use super::user::{PartialUser, User};
    pub use super::voice::{PartialVoiceState, VoiceState};
}
