use crate::cache::Fetchable;
use crate::model::prelude::*;

/// A REST path this library issues reads against.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum Route {
    User(UserId),
    Guild(GuildId),
    Channel(ChannelId),
    ChannelMessage(ChannelId, MessageId),
}

impl Route {
    /// The path component of the route, relative to the API base.
    #[must_use]
    pub fn path(&self) -> String {
        match self {
            Route::User(user_id) => format!("/users/{user_id}"),
            Route::Guild(guild_id) => format!("/guilds/{guild_id}"),
            Route::Channel(channel_id) => format!("/channels/{channel_id}"),
            Route::ChannelMessage(channel_id, message_id) => {
                format!("/channels/{channel_id}/messages/{message_id}")
            },
        }
    }
}

impl Fetchable for User {
    fn route(id: UserId) -> Route {
        Route::User(id)
    }
}

impl Fetchable for Guild {
    fn route(id: GuildId) -> Route {
        Route::Guild(id)
    }
}
