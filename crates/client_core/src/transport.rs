//! HTTP access to the messaging server's REST endpoints.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use reqwest::{
    cookie::{CookieStore, Jar},
    Client, RequestBuilder, Response, StatusCode,
};
use serde::de::DeserializeOwned;
use shared::{
    domain::Navigation,
    error::FieldErrorBody,
    protocol::{
        LatestThreadsResponse, LoginRequest, LoginResponse, RegistrationRequest,
        SendMessageRequest, ThreadPayload, UserSearchResponse, UserSummary,
    },
};
use tracing::{debug, warn};
use url::Url;

use crate::{
    config::ClientSettings,
    cookie::{csrf_token, CSRF_HEADER},
    error::{ClientError, Result},
};

pub const LATEST_MESSAGES_PATH: &str = "/api/messages/latest/";
pub const USER_SEARCH_PATH: &str = "/api/users/search/";
pub const SEND_MESSAGE_PATH: &str = "/api/messages/send/";
pub const LOGIN_PATH: &str = "/login/";
pub const LOGOUT_PATH: &str = "/logout/";
pub const REGISTRATION_PATH: &str = "/registration/";

/// Status the server answers API calls with once the idle session timed out.
const SESSION_EXPIRED_STATUS: u16 = 440;

#[async_trait]
pub trait MessagingApi: Send + Sync {
    /// Loads the login page so the server issues its CSRF cookie.
    async fn prime_csrf(&self) -> Result<()>;
    async fn latest_threads(&self) -> Result<Vec<ThreadPayload>>;
    async fn search_users(&self, query: &str) -> Result<Vec<UserSummary>>;
    async fn send_message(&self, request: &SendMessageRequest) -> Result<()>;
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse>;
    /// Returns the view the server landed on after the form post.
    async fn register(&self, request: &RegistrationRequest) -> Result<Navigation>;
    async fn logout(&self) -> Result<()>;
}

pub struct HttpMessagingApi {
    http: Client,
    base_url: Url,
    cookies: Arc<Jar>,
}

impl HttpMessagingApi {
    pub fn new(server_url: &str) -> Result<Self> {
        Self::build(server_url, None)
    }

    pub fn from_settings(settings: &ClientSettings) -> Result<Self> {
        Self::build(&settings.server_url, Some(settings.request_timeout()))
    }

    fn build(server_url: &str, timeout: Option<Duration>) -> Result<Self> {
        let base_url = Url::parse(server_url)?;
        let cookies = Arc::new(Jar::default());
        let mut builder = Client::builder().cookie_provider(Arc::clone(&cookies));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build()?,
            base_url,
            cookies,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Current CSRF token from the cookie jar, if the server issued one.
    pub fn csrf_token(&self) -> Option<String> {
        let header = self.cookies.cookies(&self.base_url)?;
        csrf_token(header.to_str().ok()?)
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }

    /// Mutating request; same-origin targets carry the CSRF header.
    fn post(&self, url: Url) -> RequestBuilder {
        let same_origin = url.origin() == self.base_url.origin();
        let builder = self.http.post(url);
        match self.csrf_token().filter(|_| same_origin) {
            Some(token) => builder.header(CSRF_HEADER, token),
            None => {
                if same_origin {
                    debug!("transport: no csrf cookie present for mutating request");
                }
                builder
            }
        }
    }
}

async fn check_status(response: Response, path: &str) -> Result<Response> {
    let status = response.status();
    if status.as_u16() == SESSION_EXPIRED_STATUS {
        return Err(ClientError::SessionExpired);
    }
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    match serde_json::from_str::<FieldErrorBody>(&body) {
        Ok(field_error) => Err(ClientError::Field(field_error.into())),
        Err(_) => {
            warn!(path, status = status.as_u16(), "transport: request failed");
            Err(ClientError::Status {
                status: status.as_u16(),
                path: path.to_string(),
            })
        }
    }
}

async fn decode<T: DeserializeOwned>(response: Response, path: &str) -> Result<T> {
    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|source| ClientError::Decode {
        path: path.to_string(),
        source,
    })
}

#[async_trait]
impl MessagingApi for HttpMessagingApi {
    async fn prime_csrf(&self) -> Result<()> {
        let response = self.http.get(self.endpoint(LOGIN_PATH)?).send().await?;
        if response.status() != StatusCode::OK {
            debug!(
                status = response.status().as_u16(),
                "transport: login page answered with non-200 status"
            );
        }
        Ok(())
    }

    async fn latest_threads(&self) -> Result<Vec<ThreadPayload>> {
        let response = self
            .http
            .get(self.endpoint(LATEST_MESSAGES_PATH)?)
            .send()
            .await?;
        let response = check_status(response, LATEST_MESSAGES_PATH).await?;
        let body: LatestThreadsResponse = decode(response, LATEST_MESSAGES_PATH).await?;
        Ok(body.threads)
    }

    async fn search_users(&self, query: &str) -> Result<Vec<UserSummary>> {
        let response = self
            .http
            .get(self.endpoint(USER_SEARCH_PATH)?)
            .query(&[("username", query)])
            .send()
            .await?;
        let response = check_status(response, USER_SEARCH_PATH).await?;
        let body: UserSearchResponse = decode(response, USER_SEARCH_PATH).await?;
        Ok(body.users)
    }

    async fn send_message(&self, request: &SendMessageRequest) -> Result<()> {
        let response = self
            .post(self.endpoint(SEND_MESSAGE_PATH)?)
            .form(request)
            .send()
            .await?;
        check_status(response, SEND_MESSAGE_PATH).await?;
        Ok(())
    }

    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse> {
        let response = self
            .post(self.endpoint(LOGIN_PATH)?)
            .form(request)
            .send()
            .await?;
        let response = check_status(response, LOGIN_PATH).await?;
        decode(response, LOGIN_PATH).await
    }

    async fn register(&self, request: &RegistrationRequest) -> Result<Navigation> {
        let response = self
            .post(self.endpoint(REGISTRATION_PATH)?)
            .form(request)
            .send()
            .await?;
        let landed_on = response.url().path().to_string();
        check_status(response, REGISTRATION_PATH).await?;
        Ok(Navigation::from_path(&landed_on))
    }

    async fn logout(&self) -> Result<()> {
        let response = self.post(self.endpoint(LOGOUT_PATH)?).send().await?;
        check_status(response, LOGOUT_PATH).await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
