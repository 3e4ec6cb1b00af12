use std::error::Error as StdError;
use std::fmt;

use crate::gateway::voice::VoiceError;
use crate::gateway::GatewayError;
use crate::http::HttpError;

/// The common result type between most library functions.
///
/// The library exposes functions which, for a result type, expose only one
/// type, rather than the usual 2 (`Result<T, Error>`). This is because all
/// functions that return a result return the library's [`Error`], so this is
/// implied, and a "simpler" result is used.
pub type Result<T> = std::result::Result<T, Error>;

/// A common error enum returned by most of the library's functionality within
/// a custom [`Result`].
///
/// Failures that the object model recovers from on its own (an unknown entity
/// reported by the REST API, a malformed dispatch payload, a voice join on a
/// non-bot login) never surface through this type. Only the call sites that
/// explicitly request a remote round trip, or misuse the construction order,
/// see an `Error`.
#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    /// An error from the HTTP layer, such as a non-successful status code.
    Http(HttpError),
    /// An error while decoding a payload with `serde_json`.
    Json(serde_json::Error),
    /// An error from the gateway connection seam.
    Gateway(GatewayError),
    /// An error within the voice signaling bridge.
    Voice(VoiceError),
    /// Some other error. This is only used for "expected value" errors where a
    /// more detailed variant cannot easily be provided.
    Other(&'static str),
}

impl From<HttpError> for Error {
    fn from(e: HttpError) -> Error {
        Error::Http(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Error {
        Error::Json(e)
    }
}

impl From<GatewayError> for Error {
    fn from(e: GatewayError) -> Error {
        Error::Gateway(e)
    }
}

impl From<VoiceError> for Error {
    fn from(e: VoiceError) -> Error {
        Error::Voice(e)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Http(inner) => fmt::Display::fmt(inner, f),
            Error::Json(inner) => fmt::Display::fmt(inner, f),
            Error::Gateway(inner) => fmt::Display::fmt(inner, f),
            Error::Voice(inner) => fmt::Display::fmt(inner, f),
            Error::Other(msg) => f.write_str(msg),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Error::Http(inner) => Some(inner),
            Error::Json(inner) => Some(inner),
            Error::Gateway(inner) => Some(inner),
            Error::Voice(inner) => Some(inner),
            Error::Other(_) => None,
        }
    }
}
