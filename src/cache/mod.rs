//! A cache of the entities received from the gateway.
//!
//! Using the cache allows avoiding REST API requests where possible. Following
//! a policy of never handing out locks, the cache clones values when handing
//! them to callers; internally a single value exists per id, and every payload
//! received for that id is merged into it in place. Holders of an id therefore
//! always observe the most recent state by resolving through the cache again.
//!
//! The building block is [`EntityCache`], a keyed, first-insertion-ordered
//! collection generic over the [`Entity`] capability trait. The session-level
//! [`Cache`] owns one per top-level entity kind; aggregates own their own
//! scoped ones (a guild its channels, a channel its messages).

use std::collections::hash_map::Entry;
use std::collections::{HashMap, VecDeque};
use std::fmt::Debug;
use std::hash::Hash;

use parking_lot::RwLock;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use crate::http::{HttpError, Requester};
use crate::model::prelude::*;
use crate::Result;

mod settings;

pub use self::settings::Settings;

/// The capability an entity needs to live in an [`EntityCache`]: an identity
/// key and a merge operation over the raw partial payloads the gateway sends.
///
/// Merging must be lossy-free: a field the partial does not carry keeps its
/// previous value. This is what lets later, sparser payloads (a message edit,
/// a user profile change) land on top of earlier full ones without erasing
/// anything.
pub trait Entity: Sized {
    /// The id type the cache keys this entity by.
    type Id: Copy + Eq + Hash + Debug;
    /// The raw payload shape this entity is built from and merged with.
    type Partial;
    /// Parent context needed to construct a fresh entity, e.g. the owning
    /// guild's id for a channel. `()` for top-level entities.
    type Context;

    fn id(&self) -> Self::Id;

    /// Extracts the identity key from a raw payload, if it carries one.
    fn key_of(partial: &Self::Partial) -> Option<Self::Id>;

    /// Constructs a new entity from its first payload.
    fn from_partial(id: Self::Id, partial: Self::Partial, ctx: &Self::Context) -> Self;

    /// Applies a partial payload over the current state.
    fn merge(&mut self, partial: Self::Partial);
}

/// Either an entity instance or its bare id, for call sites that accept both.
#[derive(Clone, Debug)]
pub enum Resolvable<T: Entity> {
    Instance(T),
    Id(T::Id),
}

impl<T: Entity> From<T> for Resolvable<T> {
    fn from(instance: T) -> Self {
        Resolvable::Instance(instance)
    }
}

macro_rules! resolvable_id {
    ($($entity:ty => $id:ty;)*) => {
        $(
            impl From<$id> for Resolvable<$entity> {
                fn from(id: $id) -> Self {
                    Resolvable::Id(id)
                }
            }
        )*
    };
}

resolvable_id! {
    User => UserId;
    Guild => GuildId;
    Channel => ChannelId;
    Message => MessageId;
}

/// A keyed collection of entities that preserves first-insertion order and
/// merges instead of replacing.
#[derive(Clone, Debug)]
pub struct EntityCache<T: Entity> {
    entries: HashMap<T::Id, T>,
    order: VecDeque<T::Id>,
}

impl<T: Entity> EntityCache<T> {
    #[must_use]
    pub fn new() -> EntityCache<T> {
        EntityCache {
            entries: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    /// Creates or updates the entity the payload describes.
    ///
    /// If an entity with the payload's id already exists, the payload is
    /// merged into it and that same entry is returned, so references held
    /// elsewhere (always ids, resolved through this cache) keep observing the
    /// updated state. Otherwise a new entity is constructed with `ctx` and
    /// inserted at the back of the insertion order.
    ///
    /// Returns `None` only when the payload carries no id, which callers
    /// treat as a malformed event to drop.
    pub fn upsert(&mut self, partial: T::Partial, ctx: &T::Context) -> Option<&mut T> {
        let id = T::key_of(&partial)?;

        match self.entries.entry(id) {
            Entry::Occupied(entry) => {
                let existing = entry.into_mut();
                existing.merge(partial);
                Some(existing)
            },
            Entry::Vacant(entry) => {
                self.order.push_back(id);
                Some(entry.insert(T::from_partial(id, partial, ctx)))
            },
        }
    }

    /// Resolves an instance-or-id to an entity, without any remote fetch.
    ///
    /// An instance passes through unchanged; an id is looked up in the cache.
    pub fn resolve(&self, value: impl Into<Resolvable<T>>) -> Option<T>
    where
        T: Clone,
    {
        match value.into() {
            Resolvable::Instance(instance) => Some(instance),
            Resolvable::Id(id) => self.entries.get(&id).cloned(),
        }
    }

    /// Extracts the id from an instance-or-id.
    pub fn resolve_id(value: impl Into<Resolvable<T>>) -> T::Id {
        match value.into() {
            Resolvable::Instance(instance) => instance.id(),
            Resolvable::Id(id) => id,
        }
    }

    pub fn get(&self, id: &T::Id) -> Option<&T> {
        self.entries.get(id)
    }

    pub fn get_mut(&mut self, id: &T::Id) -> Option<&mut T> {
        self.entries.get_mut(id)
    }

    pub fn contains(&self, id: &T::Id) -> bool {
        self.entries.contains_key(id)
    }

    /// Removes and returns the entity with the given id.
    pub fn remove(&mut self, id: &T::Id) -> Option<T> {
        let removed = self.entries.remove(id)?;
        self.order.retain(|other| other != id);

        Some(removed)
    }

    /// Removes and returns the least recently inserted entity.
    pub fn evict_oldest(&mut self) -> Option<T> {
        let id = self.order.pop_front()?;

        self.entries.remove(&id)
    }

    /// Iterates entities in first-insertion order.
    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.order.iter().filter_map(|id| self.entries.get(id))
    }

    /// Ids in first-insertion order.
    pub fn ids(&self) -> impl Iterator<Item = T::Id> + '_ {
        self.order.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T: Entity> Default for EntityCache<T> {
    fn default() -> EntityCache<T> {
        EntityCache::new()
    }
}

/// Options controlling the cache-vs-remote behavior of a fetch.
#[derive(Clone, Copy, Debug)]
pub struct FetchOptions {
    /// Whether to consult the cache before the request and store the response
    /// after it. With this unset the response is constructed but not stored.
    pub use_cache: bool,
    /// Whether to hit the remote even on a cache hit.
    pub force_refresh: bool,
}

impl Default for FetchOptions {
    fn default() -> FetchOptions {
        FetchOptions {
            use_cache: true,
            force_refresh: false,
        }
    }
}

impl FetchOptions {
    #[must_use]
    pub fn new() -> FetchOptions {
        FetchOptions::default()
    }

    #[must_use]
    pub fn force_refresh(mut self) -> FetchOptions {
        self.force_refresh = true;
        self
    }

    #[must_use]
    pub fn skip_cache(mut self) -> FetchOptions {
        self.use_cache = false;
        self
    }
}

/// A top-level entity kind that can be read back over REST by bare id.
pub trait Fetchable: Entity<Context = ()> {
    fn route(id: Self::Id) -> crate::http::Route;
}

/// The session-level cache, owning one [`EntityCache`] per top-level entity
/// kind. Everything scoped lives inside its owner: channels inside their
/// guild, messages inside their channel.
#[derive(Debug, Default)]
pub struct Cache {
    pub(crate) users: RwLock<EntityCache<User>>,
    pub(crate) guilds: RwLock<EntityCache<Guild>>,
    /// The user the session is logged in as.
    pub(crate) current_user: RwLock<Option<User>>,
    settings: RwLock<Settings>,
}

impl Cache {
    /// Creates a new cache.
    #[must_use]
    pub fn new() -> Cache {
        Cache::default()
    }

    /// Creates a new cache instance with settings applied.
    #[must_use]
    pub fn new_with_settings(settings: Settings) -> Cache {
        Cache {
            settings: RwLock::new(settings),
            ..Default::default()
        }
    }

    /// Returns a copy of the settings.
    pub fn settings(&self) -> Settings {
        self.settings.read().clone()
    }

    /// Sets the maximum number of messages cached per channel.
    pub fn set_max_messages(&self, max: usize) {
        self.settings.write().max_messages = max;
    }

    /// Clones the user the session is logged in as, if a ready snapshot has
    /// been applied.
    pub fn current_user(&self) -> Option<User> {
        self.current_user.read().clone()
    }

    /// Resolves a user instance-or-id against the user cache.
    pub fn user(&self, user: impl Into<Resolvable<User>>) -> Option<User> {
        self.users.read().resolve(user)
    }

    /// Resolves a guild instance-or-id against the guild cache.
    pub fn guild(&self, guild: impl Into<Resolvable<Guild>>) -> Option<Guild> {
        self.guilds.read().resolve(guild)
    }

    /// Retrieves a channel by id, searching every cached guild.
    pub fn channel(&self, id: impl Into<ChannelId>) -> Option<Channel> {
        let id = id.into();

        self.guilds
            .read()
            .values()
            .find_map(|guild| guild.channels.get(&id))
            .cloned()
    }

    /// Retrieves a message from a channel's scoped message cache.
    pub fn message(
        &self,
        channel_id: impl Into<ChannelId>,
        message_id: impl Into<MessageId>,
    ) -> Option<Message> {
        let channel_id = channel_id.into();
        let message_id = message_id.into();

        self.guilds
            .read()
            .values()
            .find_map(|guild| guild.channels.get(&channel_id))
            .and_then(|channel| channel.messages.get(&message_id))
            .cloned()
    }

    /// Finds which guild owns a channel.
    pub fn guild_of_channel(&self, channel_id: impl Into<ChannelId>) -> Option<GuildId> {
        let channel_id = channel_id.into();

        self.guilds
            .read()
            .values()
            .find(|guild| guild.channels.contains(&channel_id))
            .map(Guild::id)
    }

    /// Ids of all cached guilds, in the order first seen.
    pub fn guilds(&self) -> Vec<GuildId> {
        self.guilds.read().ids().collect()
    }

    /// Returns the number of cached guilds.
    pub fn guild_count(&self) -> usize {
        self.guilds.read().len()
    }

    /// Returns the number of cached users.
    pub fn user_count(&self) -> usize {
        self.users.read().len()
    }

    /// Fetches a user, populating the user cache per `options`.
    pub async fn fetch_user(
        &self,
        http: &dyn Requester,
        user_id: UserId,
        options: FetchOptions,
    ) -> Result<Option<User>> {
        Self::fetch(&self.users, http, user_id, options).await
    }

    /// Fetches a guild, populating the guild cache per `options`.
    pub async fn fetch_guild(
        &self,
        http: &dyn Requester,
        guild_id: GuildId,
        options: FetchOptions,
    ) -> Result<Option<Guild>> {
        Self::fetch(&self.guilds, http, guild_id, options).await
    }

    /// The shared fetch path: consult the cache unless refreshing, otherwise
    /// issue a remote read and merge the response in.
    ///
    /// A 404 from the remote evicts whatever the cache held for that id and
    /// yields `Ok(None)`; any other failure propagates unchanged. The lock is
    /// only held around cache operations, never across the round trip.
    async fn fetch<T>(
        cache: &RwLock<EntityCache<T>>,
        http: &dyn Requester,
        id: T::Id,
        options: FetchOptions,
    ) -> Result<Option<T>>
    where
        T: Fetchable + Clone,
        T::Partial: DeserializeOwned,
    {
        if options.use_cache && !options.force_refresh {
            if let Some(hit) = cache.read().get(&id) {
                return Ok(Some(hit.clone()));
            }
        }

        match http.get(T::route(id)).await {
            Ok(raw) => {
                let partial: T::Partial = serde_json::from_value(raw)?;

                if options.use_cache {
                    Ok(cache.write().upsert(partial, &()).map(|entity| entity.clone()))
                } else {
                    Ok(T::key_of(&partial).map(|id| T::from_partial(id, partial, &())))
                }
            },
            Err(HttpError::UnsuccessfulRequest(response))
                if response.status_code == StatusCode::NOT_FOUND =>
            {
                cache.write().remove(&id);
                Ok(None)
            },
            Err(source) => Err(source.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn partial_user(value: serde_json::Value) -> PartialUser {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn upsert_merges_into_the_same_entry() {
        let mut cache = EntityCache::<User>::new();

        cache.upsert(
            partial_user(json!({"id": "1", "username": "a", "discriminator": "1234"})),
            &(),
        );
        cache.upsert(partial_user(json!({"id": "1", "discriminator": "0"})), &());

        assert_eq!(cache.len(), 1);
        let user = cache.get(&UserId::new(1)).unwrap();
        // Fields from the second payload override, absent fields are kept.
        assert_eq!(user.name, "a");
        assert_eq!(user.discriminator, 0);
        assert_eq!(user.tag(), "a");
    }

    #[test]
    fn upsert_without_a_key_is_dropped() {
        let mut cache = EntityCache::<User>::new();
        assert!(cache.upsert(partial_user(json!({"username": "a"})), &()).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn insertion_order_is_preserved() {
        let mut cache = EntityCache::<User>::new();
        for id in ["3", "1", "2"] {
            cache.upsert(partial_user(json!({"id": id, "username": id})), &());
        }
        // A merge does not reorder.
        cache.upsert(partial_user(json!({"id": "3", "username": "three"})), &());

        let order: Vec<u64> = cache.values().map(|u| u.id.get()).collect();
        assert_eq!(order, [3, 1, 2]);

        assert_eq!(cache.evict_oldest().unwrap().id, UserId::new(3));
        let order: Vec<u64> = cache.ids().map(UserId::get).collect();
        assert_eq!(order, [1, 2]);
    }

    #[test]
    fn resolve_accepts_instances_and_ids() {
        let mut cache = EntityCache::<User>::new();
        cache.upsert(partial_user(json!({"id": "1", "username": "a"})), &());

        let hit = cache.resolve(UserId::new(1)).unwrap();
        assert_eq!(hit.name, "a");
        assert!(cache.resolve(UserId::new(2)).is_none());

        // An instance passes through untouched, cached or not.
        let detached = User::from_partial(
            UserId::new(9),
            partial_user(json!({"id": "9", "username": "z"})),
            &(),
        );
        let resolved = cache.resolve(detached.clone()).unwrap();
        assert_eq!(resolved.id, detached.id);

        assert_eq!(EntityCache::<User>::resolve_id(UserId::new(5)), UserId::new(5));
        assert_eq!(EntityCache::<User>::resolve_id(detached), UserId::new(9));
    }

    #[test]
    fn remove_keeps_order_consistent() {
        let mut cache = EntityCache::<User>::new();
        for id in ["1", "2", "3"] {
            cache.upsert(partial_user(json!({"id": id})), &());
        }

        assert!(cache.remove(&UserId::new(2)).is_some());
        assert!(cache.remove(&UserId::new(2)).is_none());
        let order: Vec<u64> = cache.ids().map(UserId::get).collect();
        assert_eq!(order, [1, 3]);
    }

    #[test]
    fn cache_lookups_cross_the_graph() {
        let cache = Cache::new();
        {
            let mut guilds = cache.guilds.write();
            let guild = guilds
                .upsert(
                    serde_json::from_value(json!({
                        "id": "1",
                        "name": "g",
                        "channels": [{"id": "10", "type": 0, "name": "general"}],
                    }))
                    .unwrap(),
                    &(),
                )
                .unwrap();
            guild.channels.get_mut(&ChannelId::new(10)).unwrap().messages.upsert(
                serde_json::from_value(json!({"id": "100", "channel_id": "10", "content": "hi"}))
                    .unwrap(),
                &ChannelId::new(10),
            );
        }

        assert_eq!(cache.guild_count(), 1);
        assert_eq!(cache.channel(ChannelId::new(10)).unwrap().name.as_deref(), Some("general"));
        assert_eq!(cache.guild_of_channel(ChannelId::new(10)), Some(GuildId::new(1)));
        assert_eq!(
            cache.message(ChannelId::new(10), MessageId::new(100)).unwrap().content,
            "hi"
        );
        assert!(cache.channel(ChannelId::new(11)).is_none());
    }
}
