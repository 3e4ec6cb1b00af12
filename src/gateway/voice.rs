//! The voice signaling bridge.
//!
//! Voice media itself is carried by an external transport; what it needs from
//! this crate is a path for signaling through the one authenticated gateway
//! connection. The bridge multiplexes that path across guilds: the transport
//! obtains a [`VoiceAdapterFactory`] per guild, registers a handler pair for
//! the two inbound signaling events, and gets back a narrow send/destroy
//! handle.
//!
//! The feature is gated by login type. User logins that attempt real voice
//! signaling trip a decode-error close loop on the gateway, so for them the
//! factory degrades to a stub whose sends always report failure without
//! touching the wire.

use std::collections::HashMap;
use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::{json, Value};
use tracing::{debug, warn};

use super::ConnectionHandle;
use crate::client::LoginType;
use crate::constants::OpCode;
use crate::model::id::GuildId;

/// An error within the voice signaling bridge.
#[derive(Debug)]
#[non_exhaustive]
pub enum VoiceError {
    /// An adapter factory was requested before the bridge was attached to its
    /// session. This is a construction-order bug in the hosting application,
    /// not a runtime condition: attach the connection first.
    Detached,
}

impl fmt::Display for VoiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VoiceError::Detached => {
                f.write_str("the voice bridge is not attached to a gateway connection")
            },
        }
    }
}

impl StdError for VoiceError {}

/// The callback pair a voice transport registers for one guild.
///
/// Both hooks receive the raw event payload exactly as dispatched; ordering
/// between the two events is not guaranteed, they are forwarded in arrival
/// order with no buffering.
pub struct VoiceAdapterHandlers {
    pub on_voice_state_update: Box<dyn Fn(&Value) + Send + Sync>,
    pub on_voice_server_update: Box<dyn Fn(&Value) + Send + Sync>,
}

impl fmt::Debug for VoiceAdapterHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VoiceAdapterHandlers").finish_non_exhaustive()
    }
}

/// The per-session voice signaling bridge, holding one registered adapter at
/// most per guild.
pub struct VoiceGateway {
    connection: Arc<dyn ConnectionHandle>,
    login_type: LoginType,
    handlers: RwLock<HashMap<GuildId, Arc<VoiceAdapterHandlers>>>,
}

impl fmt::Debug for VoiceGateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VoiceGateway")
            .field("login_type", &self.login_type)
            .finish_non_exhaustive()
    }
}

impl VoiceGateway {
    pub(crate) fn new(connection: Arc<dyn ConnectionHandle>, login_type: LoginType) -> VoiceGateway {
        VoiceGateway {
            connection,
            login_type,
            handlers: RwLock::new(HashMap::new()),
        }
    }

    /// Creates the adapter factory for a guild, which the external voice
    /// transport invokes once per join attempt.
    ///
    /// On a non-bot login this returns a gated factory: its adapters ignore
    /// the registered handlers and refuse every send.
    pub fn adapter_factory(self: &Arc<Self>, guild_id: GuildId) -> VoiceAdapterFactory {
        let bridge = (self.login_type == LoginType::Bot).then(|| Arc::clone(self));

        VoiceAdapterFactory { bridge, guild_id }
    }

    /// Routes an inbound `VOICE_STATE_UPDATE` to the guild's registered
    /// adapter, if any.
    pub fn dispatch_voice_state_update(&self, data: &Value) {
        let Some(guild_id) = guild_id_of(data) else {
            debug!("dropping voice event without a guild id");
            return;
        };

        // The lock is released before the callback runs, so a callback is
        // free to destroy or replace its own registration.
        let entry = self.handlers.read().get(&guild_id).cloned();
        if let Some(entry) = entry {
            (entry.on_voice_state_update)(data);
        }
        // No adapter means voice was never joined for this guild; expected.
    }

    /// Routes an inbound `VOICE_SERVER_UPDATE` to the guild's registered
    /// adapter, if any.
    pub fn dispatch_voice_server_update(&self, data: &Value) {
        let Some(guild_id) = guild_id_of(data) else {
            debug!("dropping voice event without a guild id");
            return;
        };

        let entry = self.handlers.read().get(&guild_id).cloned();
        if let Some(entry) = entry {
            (entry.on_voice_server_update)(data);
        }
    }

    pub(crate) fn detach_all(&self) {
        self.handlers.write().clear();
    }
}

/// Extracts the guild id a voice event is scoped to.
fn guild_id_of(data: &Value) -> Option<GuildId> {
    match data.get("guild_id") {
        Some(Value::String(s)) => s.parse().ok(),
        Some(Value::Number(n)) => n.as_u64().map(GuildId::new),
        _ => None,
    }
}

/// A factory handed to the external voice transport; invoked once per join
/// attempt with the transport's handler pair.
#[derive(Clone, Debug)]
pub struct VoiceAdapterFactory {
    /// `None` when the login type is gated away from voice signaling.
    bridge: Option<Arc<VoiceGateway>>,
    guild_id: GuildId,
}

impl VoiceAdapterFactory {
    /// Registers the handler pair for this factory's guild, replacing any
    /// prior registration, and returns the transport's handle.
    pub fn create(&self, handlers: VoiceAdapterHandlers) -> VoiceAdapter {
        match &self.bridge {
            Some(bridge) => {
                bridge.handlers.write().insert(self.guild_id, Arc::new(handlers));

                VoiceAdapter {
                    bridge: Some(Arc::clone(bridge)),
                    guild_id: self.guild_id,
                }
            },
            None => VoiceAdapter {
                bridge: None,
                guild_id: self.guild_id,
            },
        }
    }
}

/// The narrow contract the external voice transport holds: send one payload
/// kind, and unregister.
#[derive(Clone, Debug)]
pub struct VoiceAdapter {
    bridge: Option<Arc<VoiceGateway>>,
    guild_id: GuildId,
}

impl VoiceAdapter {
    /// Transmits a voice-state signaling payload over the gateway connection.
    ///
    /// Returns whether the payload was handed to the connection. A closed
    /// connection is an expected, frequent condition and reports `false`
    /// rather than an error; the transport retries the join on its own
    /// schedule. On a gated (non-bot) login this always returns `false` and
    /// never touches the connection.
    pub fn send_payload(&self, payload: &Value) -> bool {
        let Some(bridge) = &self.bridge else {
            warn!(
                guild_id = %self.guild_id,
                "voice signaling is not available on this login type; dropping payload"
            );
            return false;
        };

        if !bridge.connection.is_open() {
            return false;
        }

        let mut payload = payload.clone();
        if let Some(fields) = payload.as_object_mut() {
            // The signaling opcode cannot set these for the account itself;
            // neutralize them rather than transmit values the server would
            // reject.
            fields.insert("self_mute".to_owned(), Value::Null);
            fields.insert("self_deaf".to_owned(), Value::Null);
        }

        let envelope = json!({
            "op": OpCode::VoiceStateUpdate.num(),
            "d": payload,
        });

        match bridge.connection.send(envelope) {
            Ok(()) => true,
            Err(why) => {
                warn!("failed to queue voice payload: {why}");
                false
            },
        }
    }

    /// Unregisters this guild's adapter. Events already dispatched before the
    /// call are not retracted.
    pub fn destroy(&self) {
        if let Some(bridge) = &self.bridge {
            bridge.handlers.write().remove(&self.guild_id);
        }
    }
}
