//! A set of constants used throughout the library.

use crate::{Error, Result};

/// The base URL for the REST API.
pub const API_BASE: &str = "https://discord.com/api/v10";
/// The base URL of the CDN, used when computing avatar and icon URLs.
pub const CDN_BASE: &str = "https://cdn.discordapp.com";
/// The gateway version the dispatch payloads are shaped for.
pub const GATEWAY_VERSION: u8 = 10;
/// The UserAgent sent along with every request.
pub const USER_AGENT: &str =
    concat!("DiscordBot (https://docs.rs/halcyon, ", env!("CARGO_PKG_VERSION"), ")");
/// The first second of 2015, in milliseconds. Every snowflake id encodes its
/// creation time as an offset from this instant.
pub const DISCORD_EPOCH: u64 = 1_420_070_400_000;

/// An enum representing the gateway opcodes.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum OpCode {
    /// A dispatched event.
    Dispatch,
    /// A periodic keep-alive.
    Heartbeat,
    /// A handshake during the initial connection.
    Identify,
    /// A client-side presence change.
    PresenceUpdate,
    /// Used to join, move between, and leave voice channels.
    VoiceStateUpdate,
    /// A ping to a voice server.
    VoiceServerPing,
    /// Used to resume a closed connection.
    Resume,
    /// A server-side request to reconnect.
    Reconnect,
    /// A request for offline guild members.
    RequestGuildMembers,
    /// Indicates the session is invalidated.
    InvalidSession,
    /// Sent immediately after connecting.
    Hello,
    /// An acknowledgement of a heartbeat.
    HeartbeatAck,
}

impl OpCode {
    pub fn from_num(num: u8) -> Result<OpCode> {
        match num {
            0 => Ok(OpCode::Dispatch),
            1 => Ok(OpCode::Heartbeat),
            2 => Ok(OpCode::Identify),
            3 => Ok(OpCode::PresenceUpdate),
            4 => Ok(OpCode::VoiceStateUpdate),
            5 => Ok(OpCode::VoiceServerPing),
            6 => Ok(OpCode::Resume),
            7 => Ok(OpCode::Reconnect),
            8 => Ok(OpCode::RequestGuildMembers),
            9 => Ok(OpCode::InvalidSession),
            10 => Ok(OpCode::Hello),
            11 => Ok(OpCode::HeartbeatAck),
            _ => Err(Error::Other("unknown gateway opcode")),
        }
    }

    pub fn num(self) -> u8 {
        match self {
            OpCode::Dispatch => 0,
            OpCode::Heartbeat => 1,
            OpCode::Identify => 2,
            OpCode::PresenceUpdate => 3,
            OpCode::VoiceStateUpdate => 4,
            OpCode::VoiceServerPing => 5,
            OpCode::Resume => 6,
            OpCode::Reconnect => 7,
            OpCode::RequestGuildMembers => 8,
            OpCode::InvalidSession => 9,
            OpCode::Hello => 10,
            OpCode::HeartbeatAck => 11,
        }
    }
}
