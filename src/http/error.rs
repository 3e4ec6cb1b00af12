use std::error::Error as StdError;
use std::fmt;

use reqwest::header::InvalidHeaderValue;
use reqwest::{Error as ReqwestError, Response, StatusCode};
use url::{ParseError as UrlError, Url};

/// The snapshot of a non-successful response that survives the response body
/// being consumed.
#[derive(Debug, Clone)]
pub struct ErrorResponse {
    pub status_code: StatusCode,
    pub url: Url,
    pub body: String,
}

impl ErrorResponse {
    pub async fn from_response(response: Response) -> Self {
        ErrorResponse {
            status_code: response.status(),
            url: response.url().clone(),
            body: response
                .text()
                .await
                .unwrap_or_else(|_| "[no body to be read]".to_owned()),
        }
    }
}

#[derive(Debug)]
#[non_exhaustive]
pub enum HttpError {
    /// A non-successful status code was received for a request.
    ///
    /// A 404 is interpreted by the fetch path (cache eviction); every other
    /// status propagates to the caller as-is.
    UnsuccessfulRequest(ErrorResponse),
    /// Parsing a URL failed due to invalid input.
    Url(UrlError),
    /// A header value contained invalid input.
    InvalidHeader(InvalidHeaderValue),
    /// Sending the request itself failed.
    Request(ReqwestError),
}

impl From<ReqwestError> for HttpError {
    fn from(error: ReqwestError) -> HttpError {
        HttpError::Request(error)
    }
}

impl From<UrlError> for HttpError {
    fn from(error: UrlError) -> HttpError {
        HttpError::Url(error)
    }
}

impl From<InvalidHeaderValue> for HttpError {
    fn from(error: InvalidHeaderValue) -> HttpError {
        HttpError::InvalidHeader(error)
    }
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HttpError::UnsuccessfulRequest(response) => {
                write!(f, "request to {} failed with status {}", response.url, response.status_code)
            },
            HttpError::Url(inner) => fmt::Display::fmt(inner, f),
            HttpError::InvalidHeader(inner) => fmt::Display::fmt(inner, f),
            HttpError::Request(inner) => fmt::Display::fmt(inner, f),
        }
    }
}

impl StdError for HttpError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            HttpError::UnsuccessfulRequest(_) => None,
            HttpError::Url(inner) => Some(inner),
            HttpError::InvalidHeader(inner) => Some(inner),
            HttpError::Request(inner) => Some(inner),
        }
    }
}
