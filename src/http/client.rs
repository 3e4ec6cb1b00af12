use async_trait::async_trait;
use reqwest::header::{HeaderValue, AUTHORIZATION, USER_AGENT};
use reqwest::{Client as ReqwestClient, Method};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::debug;
use url::Url;

use super::error::ErrorResponse;
use super::routing::Route;
use super::HttpError;
use crate::client::LoginType;
use crate::constants;

/// A low-level client for the REST API, shared by the whole session.
///
/// Retries and rate-limit queuing live outside this type; it issues a single
/// round trip per call and maps non-successful statuses to
/// [`HttpError::UnsuccessfulRequest`].
pub struct Http {
    client: ReqwestClient,
    token: SecretString,
    login_type: LoginType,
}

impl Http {
    /// Creates a client that authenticates with the given token.
    ///
    /// Bot tokens are sent with the `Bot ` prefix; user tokens are sent bare.
    #[must_use]
    pub fn new(token: &str, login_type: LoginType) -> Http {
        Http {
            client: ReqwestClient::new(),
            token: SecretString::new(token.trim().to_owned()),
            login_type,
        }
    }

    fn auth_header(&self) -> Result<HeaderValue, HttpError> {
        let token = self.token.expose_secret();
        let value = match self.login_type {
            LoginType::Bot if !token.starts_with("Bot ") => format!("Bot {token}"),
            _ => token.clone(),
        };

        let mut header = HeaderValue::from_str(&value)?;
        header.set_sensitive(true);

        Ok(header)
    }
}

impl std::fmt::Debug for Http {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Http").field("login_type", &self.login_type).finish_non_exhaustive()
    }
}

/// The seam between the object model and the REST collaborator.
///
/// The cache's fetch path only depends on this trait, so tests (and unusual
/// deployments, e.g. a proxying ratelimiter) can substitute their own
/// implementation.
#[async_trait]
pub trait Requester: Send + Sync {
    /// Issues a single request, resolving to the decoded response body.
    async fn request(
        &self,
        method: Method,
        route: Route,
        body: Option<Value>,
    ) -> Result<Value, HttpError>;

    /// Issues a bodyless GET for the route.
    async fn get(&self, route: Route) -> Result<Value, HttpError> {
        self.request(Method::GET, route, None).await
    }
}

#[async_trait]
impl Requester for Http {
    async fn request(
        &self,
        method: Method,
        route: Route,
        body: Option<Value>,
    ) -> Result<Value, HttpError> {
        let url = Url::parse(&format!("{}{}", constants::API_BASE, route.path()))?;
        debug!(%url, ?method, "performing request");

        let mut request = self
            .client
            .request(method, url)
            .header(AUTHORIZATION, self.auth_header()?)
            .header(USER_AGENT, constants::USER_AGENT);
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(HttpError::UnsuccessfulRequest(
                ErrorResponse::from_response(response).await,
            ));
        }

        if response.status() == reqwest::StatusCode::NO_CONTENT {
            Ok(Value::Null)
        } else {
            response.json().await.map_err(HttpError::Request)
        }
    }
}
