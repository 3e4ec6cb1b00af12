use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use halcyon::cache::{FetchOptions, Settings};
use halcyon::client::{Client, EventHandler, LoginType};
use halcyon::gateway::voice::VoiceAdapterHandlers;
use halcyon::gateway::ChannelConnection;
use halcyon::http::{ErrorResponse, HttpError, Requester, Route};
use halcyon::model::prelude::*;
use halcyon::Error;
use reqwest::{Method, StatusCode};
use serde_json::{json, Value};

/// A scripted REST collaborator: pops one canned response per request and
/// records the routes it was asked for.
#[derive(Default)]
struct MockRequester {
    responses: Mutex<VecDeque<Result<Value, HttpError>>>,
    requests: Mutex<Vec<String>>,
}

impl MockRequester {
    fn respond(&self, response: Result<Value, HttpError>) {
        self.responses.lock().unwrap().push_back(response);
    }

    fn respond_not_found(&self) {
        self.respond(Err(HttpError::UnsuccessfulRequest(ErrorResponse {
            status_code: StatusCode::NOT_FOUND,
            url: "https://discord.com/api/v10/".parse().unwrap(),
            body: r#"{"message": "Unknown", "code": 10013}"#.to_owned(),
        })));
    }

    fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl Requester for MockRequester {
    async fn request(
        &self,
        _method: Method,
        route: Route,
        _body: Option<Value>,
    ) -> Result<Value, HttpError> {
        self.requests.lock().unwrap().push(route.path());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .expect("request issued without a scripted response")
    }
}

/// Records the notifications the client emits, in order.
#[derive(Default)]
struct RecordingHandler {
    events: Mutex<Vec<String>>,
}

#[async_trait]
impl EventHandler for RecordingHandler {
    async fn ready(&self, ready: ReadyEvent) {
        self.events.lock().unwrap().push(format!("ready:{}", ready.guilds.len()));
    }

    async fn guild_create(&self, guild: Guild) {
        self.events.lock().unwrap().push(format!("guild_create:{}", guild.id));
    }

    async fn guild_delete(&self, guild_id: GuildId) {
        self.events.lock().unwrap().push(format!("guild_delete:{guild_id}"));
    }

    async fn message_create(&self, message: Message) {
        self.events.lock().unwrap().push(format!("message_create:{}", message.id));
    }

    async fn voice_state_update(&self, guild_id: GuildId, state: Option<VoiceState>) {
        let channel = state
            .and_then(|state| state.channel_id)
            .map_or_else(|| "left".to_owned(), |id| id.to_string());
        self.events.lock().unwrap().push(format!("voice:{guild_id}:{channel}"));
    }
}

fn client(http: Arc<MockRequester>) -> Client {
    Client::builder(http, LoginType::User).build()
}

async fn seed_guild(client: &Client) {
    client
        .dispatch(
            EventType::GuildCreate,
            json!({
                "id": "1",
                "name": "guild",
                "channels": [{"id": "10", "type": 0, "name": "general"}],
            }),
        )
        .await;
}

#[tokio::test]
async fn ready_replaces_the_whole_cache() {
    let client = client(Arc::new(MockRequester::default()));

    seed_guild(&client).await;
    assert_eq!(client.cache.guild_count(), 1);

    client
        .dispatch(
            EventType::Ready,
            json!({
                "user": {"id": "5", "username": "me", "discriminator": "0"},
                "session_id": "s1",
                "guilds": [{
                    "id": "2",
                    "name": "other",
                    "members": [{"user": {"id": "7", "username": "friend"}}],
                }],
            }),
        )
        .await;

    // The old guild did not survive the snapshot.
    assert!(client.cache.guild(GuildId::new(1)).is_none());
    assert!(client.cache.guild(GuildId::new(2)).is_some());
    assert_eq!(client.cache.current_user().unwrap().name, "me");
    // Member users were hoisted into the shared user cache.
    assert_eq!(client.cache.user(UserId::new(7)).unwrap().name, "friend");
}

#[tokio::test]
async fn dispatch_flows_through_the_entity_graph() {
    let client = client(Arc::new(MockRequester::default()));
    seed_guild(&client).await;

    client
        .dispatch(
            EventType::ChannelCreate,
            json!({"id": "11", "guild_id": "1", "type": 2, "name": "voice"}),
        )
        .await;
    assert_eq!(client.cache.channel(ChannelId::new(11)).unwrap().kind, ChannelType::Voice);

    client
        .dispatch(
            EventType::MessageCreate,
            json!({
                "id": "100",
                "channel_id": "10",
                "author": {"id": "7", "username": "friend"},
                "content": "hello",
            }),
        )
        .await;
    // The guild is found by scanning for the owning channel; the author lands
    // in the user cache.
    let message = client.cache.message(ChannelId::new(10), MessageId::new(100)).unwrap();
    assert_eq!(message.content, "hello");
    assert_eq!(message.author_id, Some(UserId::new(7)));
    assert_eq!(client.cache.user(UserId::new(7)).unwrap().name, "friend");

    // An embed-only edit keeps the content.
    client
        .dispatch(
            EventType::MessageUpdate,
            json!({"id": "100", "channel_id": "10", "embeds": [{"title": "t"}]}),
        )
        .await;
    let message = client.cache.message(ChannelId::new(10), MessageId::new(100)).unwrap();
    assert_eq!(message.content, "hello");
    assert_eq!(message.embeds.len(), 1);

    client
        .dispatch(EventType::MessageDelete, json!({"id": "100", "channel_id": "10"}))
        .await;
    assert!(client.cache.message(ChannelId::new(10), MessageId::new(100)).is_none());

    client.dispatch(EventType::ChannelDelete, json!({"id": "11", "guild_id": "1"})).await;
    assert!(client.cache.channel(ChannelId::new(11)).is_none());
}

#[tokio::test]
async fn message_cache_is_bounded_per_channel() {
    let mut settings = Settings::new();
    settings.max_messages(2);
    let client = Client::builder(Arc::new(MockRequester::default()), LoginType::User)
        .cache_settings(settings)
        .build();
    seed_guild(&client).await;

    for id in 100..104 {
        client
            .dispatch(
                EventType::MessageCreate,
                json!({"id": id.to_string(), "channel_id": "10", "content": "x"}),
            )
            .await;
    }

    // Oldest first out.
    assert!(client.cache.message(ChannelId::new(10), MessageId::new(100)).is_none());
    assert!(client.cache.message(ChannelId::new(10), MessageId::new(101)).is_none());
    assert!(client.cache.message(ChannelId::new(10), MessageId::new(102)).is_some());
    assert!(client.cache.message(ChannelId::new(10), MessageId::new(103)).is_some());
}

#[tokio::test]
async fn guild_delete_distinguishes_outage_from_removal() {
    let client = client(Arc::new(MockRequester::default()));
    seed_guild(&client).await;

    client.dispatch(EventType::GuildDelete, json!({"id": "1", "unavailable": true})).await;
    let guild = client.cache.guild(GuildId::new(1)).unwrap();
    assert!(guild.unavailable);
    assert_eq!(guild.name, "guild");

    client.dispatch(EventType::GuildDelete, json!({"id": "1"})).await;
    assert!(client.cache.guild(GuildId::new(1)).is_none());
}

#[tokio::test]
async fn handler_is_notified_after_the_cache_settles() {
    let handler = Arc::new(RecordingHandler::default());
    let client = Client::builder(Arc::new(MockRequester::default()), LoginType::User)
        .event_handler(ObservingHandler(Arc::clone(&handler)))
        .build();

    client.dispatch(EventType::Ready, json!({"user": {"id": "5"}, "guilds": []})).await;
    seed_guild(&client).await;
    client
        .dispatch(
            EventType::MessageCreate,
            json!({"id": "100", "channel_id": "10", "content": "hi"}),
        )
        .await;
    client
        .dispatch(
            EventType::VoiceStateUpdate,
            json!({"guild_id": "1", "user_id": "7", "channel_id": "11", "session_id": "s"}),
        )
        .await;
    client
        .dispatch(
            EventType::VoiceStateUpdate,
            json!({"guild_id": "1", "user_id": "7", "channel_id": null}),
        )
        .await;
    client.dispatch(EventType::GuildDelete, json!({"id": "1"})).await;

    assert_eq!(
        *handler.events.lock().unwrap(),
        [
            "ready:0",
            "guild_create:1",
            "message_create:100",
            "voice:1:11",
            "voice:1:left",
            "guild_delete:1",
        ]
    );
}

/// Forwards to a shared [`RecordingHandler`], since the builder takes the
/// handler by value.
struct ObservingHandler(Arc<RecordingHandler>);

#[async_trait]
impl EventHandler for ObservingHandler {
    async fn ready(&self, ready: ReadyEvent) {
        self.0.ready(ready).await;
    }

    async fn guild_create(&self, guild: Guild) {
        self.0.guild_create(guild).await;
    }

    async fn guild_delete(&self, guild_id: GuildId) {
        self.0.guild_delete(guild_id).await;
    }

    async fn message_create(&self, message: Message) {
        self.0.message_create(message).await;
    }

    async fn voice_state_update(&self, guild_id: GuildId, state: Option<VoiceState>) {
        self.0.voice_state_update(guild_id, state).await;
    }
}

#[tokio::test]
async fn fetch_user_populates_and_then_hits_the_cache() {
    let http = Arc::new(MockRequester::default());
    let client = client(Arc::clone(&http));

    http.respond(Ok(json!({"id": "7", "username": "friend", "discriminator": "0"})));
    let user = client
        .fetch_user(UserId::new(7), FetchOptions::new())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(user.name, "friend");
    assert_eq!(http.request_count(), 1);

    // The second fetch is served from the cache without a round trip.
    let again = client.fetch_user(UserId::new(7), FetchOptions::new()).await.unwrap().unwrap();
    assert_eq!(again.name, "friend");
    assert_eq!(http.request_count(), 1);
}

#[tokio::test]
async fn force_refresh_merges_into_the_cached_identity() {
    let http = Arc::new(MockRequester::default());
    let client = client(Arc::clone(&http));

    http.respond(Ok(json!({"id": "7", "username": "friend", "discriminator": "1234"})));
    client.fetch_user(UserId::new(7), FetchOptions::new()).await.unwrap();

    // The refresh response omits the username; the merge keeps it.
    http.respond(Ok(json!({"id": "7", "discriminator": "0"})));
    let refreshed = client
        .fetch_user(UserId::new(7), FetchOptions::new().force_refresh())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(refreshed.name, "friend");
    assert_eq!(refreshed.discriminator, 0);
    assert_eq!(http.request_count(), 2);
}

#[tokio::test]
async fn a_404_evicts_the_stale_entry() {
    let http = Arc::new(MockRequester::default());
    let client = client(Arc::clone(&http));

    http.respond(Ok(json!({"id": "7", "username": "friend"})));
    client.fetch_user(UserId::new(7), FetchOptions::new()).await.unwrap();
    assert!(client.cache.user(UserId::new(7)).is_some());

    http.respond_not_found();
    let gone = client
        .fetch_user(UserId::new(7), FetchOptions::new().force_refresh())
        .await
        .unwrap();
    assert!(gone.is_none());
    assert!(client.cache.user(UserId::new(7)).is_none());
}

#[tokio::test]
async fn fetch_message_routes_through_the_owning_channel() {
    let http = Arc::new(MockRequester::default());
    let client = client(Arc::clone(&http));
    seed_guild(&client).await;

    http.respond(Ok(json!({
        "id": "100",
        "channel_id": "10",
        "author": {"id": "7", "username": "friend"},
        "content": "hello",
    })));
    let message = client
        .fetch_message(ChannelId::new(10), MessageId::new(100), FetchOptions::new())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(message.content, "hello");
    assert_eq!(
        *http.requests.lock().unwrap(),
        ["/channels/10/messages/100"]
    );

    // Stored in the channel's scoped cache, author in the user cache.
    assert!(client.cache.message(ChannelId::new(10), MessageId::new(100)).is_some());
    assert!(client.cache.user(UserId::new(7)).is_some());

    // Deleted remotely: the refresh evicts it.
    http.respond_not_found();
    let gone = client
        .fetch_message(
            ChannelId::new(10),
            MessageId::new(100),
            FetchOptions::new().force_refresh(),
        )
        .await
        .unwrap();
    assert!(gone.is_none());
    assert!(client.cache.message(ChannelId::new(10), MessageId::new(100)).is_none());
}

#[tokio::test]
async fn fetch_message_without_a_cached_channel_is_not_stored() {
    let http = Arc::new(MockRequester::default());
    let client = client(Arc::clone(&http));

    http.respond(Ok(json!({"id": "100", "channel_id": "10", "content": "hello"})));
    let message = client
        .fetch_message(ChannelId::new(10), MessageId::new(100), FetchOptions::new())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(message.content, "hello");
    assert!(client.cache.message(ChannelId::new(10), MessageId::new(100)).is_none());
}

#[tokio::test]
async fn voice_factory_requires_an_attached_connection() {
    let client = client(Arc::new(MockRequester::default()));

    match client.voice_adapter_factory(GuildId::new(1)) {
        Err(Error::Voice(_)) => {},
        other => panic!("expected a voice error, got {other:?}"),
    }

    let (connection, _outbound) = ChannelConnection::pair();
    client.attach_connection(Arc::new(connection));
    assert!(client.voice_adapter_factory(GuildId::new(1)).is_ok());
}

#[tokio::test]
async fn voice_events_reach_the_registered_adapter() {
    let client = Client::builder(Arc::new(MockRequester::default()), LoginType::Bot).build();
    let (connection, mut outbound) = ChannelConnection::pair();
    client.attach_connection(Arc::new(connection));

    let seen = Arc::new(Mutex::new(Vec::new()));
    let handlers = {
        let state = {
            let seen = Arc::clone(&seen);
            Box::new(move |data: &Value| {
                seen.lock().unwrap().push(format!("state:{}", data["session_id"]))
            }) as Box<dyn Fn(&Value) + Send + Sync>
        };
        let server = {
            let seen = Arc::clone(&seen);
            Box::new(move |data: &Value| {
                seen.lock().unwrap().push(format!("server:{}", data["token"]))
            }) as Box<dyn Fn(&Value) + Send + Sync>
        };

        VoiceAdapterHandlers {
            on_voice_state_update: state,
            on_voice_server_update: server,
        }
    };
    let adapter = client
        .voice_adapter_factory(GuildId::new(1))
        .unwrap()
        .create(handlers);

    // The raw payloads reach the adapter even though the guild is uncached.
    client
        .dispatch(
            EventType::VoiceStateUpdate,
            json!({"guild_id": "1", "user_id": "7", "session_id": "s1"}),
        )
        .await;
    client
        .dispatch(
            EventType::VoiceServerUpdate,
            json!({"guild_id": "1", "token": "t1", "endpoint": "e"}),
        )
        .await;
    assert_eq!(*seen.lock().unwrap(), ["state:\"s1\"", "server:\"t1\""]);

    assert!(adapter.send_payload(&json!({"guild_id": "1", "channel_id": "2"})));
    let frame = outbound.try_next().unwrap().unwrap();
    assert_eq!(frame["op"], 4);
    assert_eq!(frame["d"]["channel_id"], "2");

    client.shutdown();
    client
        .dispatch(EventType::VoiceStateUpdate, json!({"guild_id": "1", "session_id": "s2"}))
        .await;
    assert_eq!(seen.lock().unwrap().len(), 2);
}
