//! A set of exports to help portability of code adding the crate's commonly
//! used types in one import.
//!
//! # Examples
//!
//! Import all of the exports:
//!
//! ```rust
//! use halcyon::prelude::*;
//! ```

pub use crate::cache::{Cache, Entity, EntityCache, FetchOptions, Resolvable, Settings};
pub use crate::client::{Client, EventHandler, LoginType};
pub use crate::gateway::voice::{VoiceAdapter, VoiceAdapterFactory, VoiceAdapterHandlers};
pub use crate::gateway::{ChannelConnection, ConnectionHandle};
pub use crate::http::{Http, Requester};
pub use crate::model::prelude::*;
pub use crate::{Error, Result};
