//! Http client for the two auth endpoints.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::COOKIE;
use serde::Deserialize;
use tracing::{debug, warn};

use super::cookies::read_cookie;

pub const LOGOUT_PATH: &str = "/auth/logout/";
pub const CHECK_AUTH_PATH: &str = "/check-auth/";

/// Name of the cookie carrying the CSRF token.
pub const CSRF_COOKIE: &str = "csrftoken";

/// Outcome of a logout request that reached the server and produced a
/// well-formed answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogoutOutcome {
    /// The server confirmed the session ended.
    LoggedOut,
    /// The server answered with a non-success status.
    Rejected { status: String },
}

#[derive(Debug, Deserialize)]
struct LogoutResponse {
    status: String,
}

#[derive(Debug, Deserialize)]
struct AuthStatusResponse {
    authenticated: bool,
}

/// Server-side session operations the monitor modules depend on.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionGateway: Send + Sync {
    /// Asks the server to end the current session.
    async fn log_out(&self) -> Result<LogoutOutcome>;

    /// Asks the server whether the current session is still authenticated.
    async fn check_auth(&self) -> Result<bool>;
}

/// [SessionGateway] implementation talking http to the real server.
///
/// The cookie string is held verbatim and forwarded on every request; the
/// CSRF token is re-read from it on each logout rather than cached.
pub struct SessionClient {
    http: reqwest::Client,
    base_url: String,
    cookie_string: String,
}

impl SessionClient {
    pub fn new(base_url: impl Into<String>, cookie_string: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .build()
            .context("Couldn't construct the http client")?;
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Ok(Self {
            http,
            base_url,
            cookie_string: cookie_string.into(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

#[async_trait]
impl SessionGateway for SessionClient {
    async fn log_out(&self) -> Result<LogoutOutcome> {
        let mut request = self
            .http
            .post(self.url(LOGOUT_PATH))
            .header("X-Requested-With", "XMLHttpRequest")
            .header(COOKIE, &self.cookie_string);

        match read_cookie(&self.cookie_string, CSRF_COOKIE) {
            Some(token) => request = request.header("X-CSRFToken", token),
            // The server will reject the request; its answer still tells us
            // more than failing locally would.
            None => warn!("No {CSRF_COOKIE} cookie available, sending logout without it"),
        }

        let response: LogoutResponse = request
            .send()
            .await
            .context("Logout request didn't reach the server")?
            .json()
            .await
            .context("Logout response wasn't the expected json")?;

        debug!("Logout endpoint answered with status {:?}", response.status);
        if response.status == "success" {
            Ok(LogoutOutcome::LoggedOut)
        } else {
            Ok(LogoutOutcome::Rejected {
                status: response.status,
            })
        }
    }

    async fn check_auth(&self) -> Result<bool> {
        let response: AuthStatusResponse = self
            .http
            .get(self.url(CHECK_AUTH_PATH))
            .header(COOKIE, &self.cookie_string)
            .send()
            .await
            .context("Auth check request didn't reach the server")?
            .json()
            .await
            .context("Auth check response wasn't the expected json")?;

        Ok(response.authenticated)
    }
}
