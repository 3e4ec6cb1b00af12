//! Halcyon is an object model over Discord's gateway and REST API, designed
//! for sessions authenticated with either bot or regular user credentials.
//!
//! The transport (websocket framing, heartbeating, login) lives in the
//! hosting application; this crate supplies everything above it:
//!
//! - a typed [`model`] of the entities the gateway dispatches, each paired
//!   with the partial payload shape it is built from and merged with;
//! - a [`cache`] that keeps one identity per entity id and merges every later
//!   payload into it in place, so omitted fields are never lost;
//! - a [`client`] that routes dispatch events into the cache, notifies an
//!   [`EventHandler`], and fetches entities over REST on cache misses;
//! - a voice signaling bridge in [`gateway`] that multiplexes an external
//!   voice transport's signaling over the one authenticated connection,
//!   gated away on non-bot logins.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use halcyon::client::{Client, LoginType};
//! use halcyon::http::Http;
//! use serde_json::json;
//!
//! # async fn run() {
//! let http = Arc::new(Http::new("token", LoginType::User));
//! let client = Client::builder(http, LoginType::User).build();
//!
//! // The hosting transport feeds each dispatch frame in as it arrives.
//! client.dispatch_raw("READY", json!({"user": {"id": "1"}, "guilds": []})).await;
//! assert_eq!(client.cache.guild_count(), 0);
//! # }
//! ```
//!
//! [`EventHandler`]: client::EventHandler

#![warn(rust_2018_idioms)]

pub mod cache;
pub mod client;
pub mod constants;
pub mod gateway;
pub mod http;
pub mod model;
pub mod prelude;

mod error;

pub use crate::error::{Error, Result};
