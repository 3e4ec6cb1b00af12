//! The HTTP boundary of the object model.
//!
//! The cache and client talk to the REST API exclusively through the
//! [`Requester`] trait; [`Http`] is the stock implementation backed by
//! `reqwest`. The only status code the object model interprets is a 404,
//! which the fetch path turns into cache eviction; everything else is the
//! caller's problem, surfaced unchanged.

mod client;
mod error;
mod routing;

pub use self::client::{Http, Requester};
pub use self::error::{ErrorResponse, HttpError};
pub use self::routing::Route;
