//! The boundary to the gateway connection.
//!
//! The transport itself (websocket framing, heartbeats, reconnection) lives
//! outside this crate. The object model only needs two things from it: a way
//! to push an opcode payload onto the wire, and a readiness check. Both are
//! captured by [`ConnectionHandle`]; the hosting transport implements it and
//! feeds inbound dispatch events to [`Client::dispatch`].
//!
//! [`Client::dispatch`]: crate::client::Client::dispatch

use std::error::Error as StdError;
use std::fmt;

use futures::channel::mpsc::{unbounded, UnboundedReceiver, UnboundedSender};
use serde_json::Value;

use crate::Result;

pub mod voice;

/// An error with the gateway connection seam.
#[derive(Debug)]
#[non_exhaustive]
pub enum GatewayError {
    /// A payload was handed to a connection that is no longer open.
    Closed,
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GatewayError::Closed => f.write_str("the gateway connection is closed"),
        }
    }
}

impl StdError for GatewayError {}

/// A handle onto the authenticated gateway connection.
///
/// Implementations must be cheap to call: `send` hands the payload to the
/// transport's outbound queue and returns, it never blocks on the network.
pub trait ConnectionHandle: Send + Sync {
    /// Whether the connection is currently open and accepting payloads.
    fn is_open(&self) -> bool;

    /// Queues an opcode payload for transmission.
    fn send(&self, payload: Value) -> Result<()>;
}

/// A [`ConnectionHandle`] backed by an in-process channel, for transports that
/// drain an outbound queue from their write loop.
#[derive(Clone, Debug)]
pub struct ChannelConnection {
    sender: UnboundedSender<Value>,
}

impl ChannelConnection {
    /// Creates a connection handle and the receiving half the transport's
    /// write loop should drain.
    #[must_use]
    pub fn pair() -> (ChannelConnection, UnboundedReceiver<Value>) {
        let (sender, receiver) = unbounded();

        (ChannelConnection { sender }, receiver)
    }
}

impl ConnectionHandle for ChannelConnection {
    fn is_open(&self) -> bool {
        !self.sender.is_closed()
    }

    fn send(&self, payload: Value) -> Result<()> {
        self.sender
            .unbounded_send(payload)
            .map_err(|_| GatewayError::Closed.into())
    }
}
