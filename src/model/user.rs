//! User information-related models.

use serde::Deserialize;

use super::id::UserId;
use super::utils;
use crate::cache::Entity;
use crate::constants::CDN_BASE;

/// Information about a user, kept consistent with partial update payloads by
/// the user cache.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct User {
    /// The unique Id of the user. Can be used to calculate the account's
    /// creation date.
    pub id: UserId,
    /// The account's username. Changing this requires the account's password.
    pub name: String,
    /// The account's discriminator to differentiate the account from others
    /// with the same username. `0` means the account has been migrated to the
    /// unique-username scheme and has no discriminator.
    pub discriminator: u16,
    /// The account's avatar hash, if one is set.
    pub avatar: Option<String>,
    /// Indicator of whether the account is a bot.
    pub bot: bool,
    /// Indicator of whether the account is an official system account.
    pub system: bool,
}

/// The fields of a user that a single payload may carry. Anything absent here
/// is left untouched on merge.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct PartialUser {
    pub id: Option<UserId>,
    #[serde(rename = "username")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "utils::discriminator")]
    pub discriminator: Option<u16>,
    #[serde(default, deserialize_with = "utils::double_option")]
    pub avatar: Option<Option<String>>,
    pub bot: Option<bool>,
    pub system: Option<bool>,
}

impl User {
    /// Returns the formatted URL of the user's avatar, if one exists.
    ///
    /// This will produce a WEBP image URL, or GIF if the user has an animated
    /// avatar.
    pub fn avatar_url(&self) -> Option<String> {
        self.avatar.as_ref().map(|hash| {
            let ext = if hash.starts_with("a_") { "gif" } else { "webp" };

            format!("{CDN_BASE}/avatars/{}/{hash}.{ext}?size=1024", self.id)
        })
    }

    /// Returns the formatted URL to the user's default avatar.
    ///
    /// The avatar index is derived from the discriminator.
    #[must_use]
    pub fn default_avatar_url(&self) -> String {
        format!("{CDN_BASE}/embed/avatars/{}.png", self.discriminator % 5)
    }

    /// Retrieves the URL to the user's avatar, falling back to the default
    /// avatar if needed.
    #[must_use]
    pub fn face(&self) -> String {
        self.avatar_url().unwrap_or_else(|| self.default_avatar_url())
    }

    /// Returns the "tag" of the user: `username#discriminator` for legacy
    /// accounts, the bare username for migrated ones.
    #[must_use]
    pub fn tag(&self) -> String {
        if self.discriminator == 0 {
            self.name.clone()
        } else {
            format!("{}#{:04}", self.name, self.discriminator)
        }
    }
}

impl Entity for User {
    type Context = ();
    type Id = UserId;
    type Partial = PartialUser;

    fn id(&self) -> UserId {
        self.id
    }

    fn key_of(partial: &PartialUser) -> Option<UserId> {
        partial.id
    }

    fn from_partial(id: UserId, partial: PartialUser, _ctx: &()) -> User {
        let mut user = User {
            id,
            name: String::new(),
            discriminator: 0,
            avatar: None,
            bot: false,
            system: false,
        };
        user.merge(partial);

        user
    }

    fn merge(&mut self, partial: PartialUser) {
        if let Some(name) = partial.name {
            self.name = name;
        }
        if let Some(discriminator) = partial.discriminator {
            self.discriminator = discriminator;
        }
        if let Some(avatar) = partial.avatar {
            self.avatar = avatar;
        }
        if let Some(bot) = partial.bot {
            self.bot = bot;
        }
        if let Some(system) = partial.system {
            self.system = system;
        }
    }
}

impl From<&User> for UserId {
    fn from(user: &User) -> UserId {
        user.id
    }
}
