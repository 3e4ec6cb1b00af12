//! The session object tying the pieces together.
//!
//! A [`Client`] owns the shared [`Cache`] and the REST collaborator, and is
//! the sink the hosting transport feeds inbound dispatch events into via
//! [`Client::dispatch`]. It does not own the gateway connection itself; the
//! transport attaches one with [`Client::attach_connection`] once it is
//! authenticated, which is what makes voice signaling available.

mod dispatch;
mod event_handler;
mod login_type;

pub use self::event_handler::EventHandler;
pub use self::login_type::LoginType;

use std::sync::Arc;

use parking_lot::RwLock;
use reqwest::StatusCode;
use tracing::info;

use crate::cache::{Cache, Entity, FetchOptions, Settings};
use crate::gateway::voice::{VoiceAdapterFactory, VoiceError, VoiceGateway};
use crate::gateway::ConnectionHandle;
use crate::http::{HttpError, Requester, Route};
use crate::model::prelude::*;
use crate::{Error, Result};

/// A builder for a [`Client`], mirroring the shape of the session it creates.
pub struct ClientBuilder {
    http: Arc<dyn Requester>,
    login_type: LoginType,
    settings: Settings,
    event_handler: Option<Arc<dyn EventHandler>>,
}

impl ClientBuilder {
    /// Sets the handler notified after each dispatch event is absorbed.
    #[must_use]
    pub fn event_handler(mut self, handler: impl EventHandler + 'static) -> ClientBuilder {
        self.event_handler = Some(Arc::new(handler));
        self
    }

    /// Overrides the cache settings for the session.
    #[must_use]
    pub fn cache_settings(mut self, settings: Settings) -> ClientBuilder {
        self.settings = settings;
        self
    }

    #[must_use]
    pub fn build(self) -> Client {
        Client {
            cache: Arc::new(Cache::new_with_settings(self.settings)),
            http: self.http,
            login_type: self.login_type,
            voice: RwLock::new(None),
            event_handler: self.event_handler,
        }
    }
}

/// A session over the gateway's object model: the cache, the REST
/// collaborator, and the voice signaling bridge once a connection is attached.
pub struct Client {
    /// The session's entity cache.
    pub cache: Arc<Cache>,
    /// The REST collaborator fetches go through.
    pub http: Arc<dyn Requester>,
    login_type: LoginType,
    voice: RwLock<Option<Arc<VoiceGateway>>>,
    event_handler: Option<Arc<dyn EventHandler>>,
}

impl Client {
    /// Starts building a session around a REST collaborator.
    #[must_use]
    pub fn builder(http: Arc<dyn Requester>, login_type: LoginType) -> ClientBuilder {
        ClientBuilder {
            http,
            login_type,
            settings: Settings::new(),
            event_handler: None,
        }
    }

    /// The kind of credential this session authenticates with.
    #[must_use]
    pub fn login_type(&self) -> LoginType {
        self.login_type
    }

    /// Attaches the authenticated gateway connection, constructing the voice
    /// signaling bridge over it.
    ///
    /// Must be called before [`voice_adapter_factory`]; reattaching after a
    /// reconnect replaces the bridge and drops all adapter registrations.
    ///
    /// [`voice_adapter_factory`]: Client::voice_adapter_factory
    pub fn attach_connection(&self, connection: Arc<dyn ConnectionHandle>) {
        let bridge = Arc::new(VoiceGateway::new(connection, self.login_type));
        if let Some(old) = self.voice.write().replace(bridge) {
            old.detach_all();
        }
        info!("gateway connection attached");
    }

    /// Creates the voice adapter factory for a guild, for handing to an
    /// external voice transport.
    ///
    /// # Errors
    ///
    /// Returns [`VoiceError::Detached`] if no connection has been attached.
    pub fn voice_adapter_factory(&self, guild_id: GuildId) -> Result<VoiceAdapterFactory> {
        let voice = self.voice.read();
        let bridge = voice.as_ref().ok_or(Error::Voice(VoiceError::Detached))?;

        Ok(bridge.adapter_factory(guild_id))
    }

    /// Fetches a user, consulting the cache per `options`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, or the response cannot be
    /// decoded. An unknown user is not an error; it resolves to `Ok(None)`.
    pub async fn fetch_user(
        &self,
        user_id: UserId,
        options: FetchOptions,
    ) -> Result<Option<User>> {
        self.cache.fetch_user(&*self.http, user_id, options).await
    }

    /// Fetches a guild, consulting the cache per `options`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, or the response cannot be
    /// decoded. An unknown guild is not an error; it resolves to `Ok(None)`.
    pub async fn fetch_guild(
        &self,
        guild_id: GuildId,
        options: FetchOptions,
    ) -> Result<Option<Guild>> {
        self.cache.fetch_guild(&*self.http, guild_id, options).await
    }

    /// Fetches a message out of a channel, consulting the channel's scoped
    /// cache per `options`.
    ///
    /// A 404 evicts whatever the cache held under that id and resolves to
    /// `Ok(None)`. If the owning channel is not cached, the fetched message is
    /// handed back without being stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, or the response cannot be
    /// decoded.
    pub async fn fetch_message(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
        options: FetchOptions,
    ) -> Result<Option<Message>> {
        if options.use_cache && !options.force_refresh {
            if let Some(hit) = self.cache.message(channel_id, message_id) {
                return Ok(Some(hit));
            }
        }

        match self.http.get(Route::ChannelMessage(channel_id, message_id)).await {
            Ok(raw) => {
                let partial: PartialMessage = serde_json::from_value(raw)?;
                if let Some(author) = partial.author.clone() {
                    self.cache.users.write().upsert(author, &());
                }

                if options.use_cache {
                    let mut guilds = self.cache.guilds.write();
                    let guild_id = partial.guild_id.or_else(|| {
                        guilds
                            .values()
                            .find(|guild| guild.channels.contains(&channel_id))
                            .map(Guild::id)
                    });
                    if let Some(channel) = guild_id
                        .and_then(|guild_id| guilds.get_mut(&guild_id))
                        .and_then(|guild| guild.channels.get_mut(&channel_id))
                    {
                        return Ok(channel
                            .messages
                            .upsert(partial, &channel_id)
                            .map(|message| message.clone()));
                    }
                }

                Ok(Message::key_of(&partial)
                    .map(|id| Message::from_partial(id, partial, &channel_id)))
            },
            Err(HttpError::UnsuccessfulRequest(response))
                if response.status_code == StatusCode::NOT_FOUND =>
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

                Ok(None)
            },
            Err(source) => Err(source.into()),
        }
    }

    /// Shuts the session down, detaching the voice bridge and dropping every
    /// adapter registration. The cache is left intact for inspection.
    pub fn shutdown(&self) {
        if let Some(bridge) = self.voice.write().take() {
            bridge.detach_all();
        }
        info!("session shut down");
    }

    pub(crate) fn voice_bridge(&self) -> Option<Arc<VoiceGateway>> {
        self.voice.read().clone()
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("login_type", &self.login_type)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}
