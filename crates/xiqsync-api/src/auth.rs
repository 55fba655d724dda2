// Bearer token lifecycle
//
// One `TokenSession` per account. It logs in with username/password,
// caches the returned token for a fixed 24 hours and refreshes it once the
// token enters the 60-second safety margin before expiry. Login failures
// are surfaced as-is; retrying is the request layer's business.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Value, json};
use tracing::{debug, info};
use url::Url;

use crate::clock::Clock;
use crate::error::Error;
use crate::transport::endpoint_url;

/// Login endpoint, relative to the account base URL.
pub const LOGIN_PATH: &str = "/login";

/// Tokens are cached for this long after a successful login. The remote
/// API documents a 24 hour token lifetime and returns no expiry of its own.
pub const TOKEN_LIFETIME_SECS: i64 = 24 * 3600;

/// A token this close to expiry is treated as already expired.
pub const SAFETY_MARGIN_SECS: i64 = 60;

/// Cached token plus its validity window.
///
/// Invariant: `token` is only handed out while `now + margin < expires_at`;
/// once invalidated or expired it is cleared until the next login.
#[derive(Debug, Default)]
struct TokenState {
    token: Option<SecretString>,
    expires_at: Option<DateTime<Utc>>,
}

impl TokenState {
    fn usable(&self, now: DateTime<Utc>) -> Option<&SecretString> {
        match (&self.token, self.expires_at) {
            (Some(token), Some(expires_at))
                if now + TimeDelta::seconds(SAFETY_MARGIN_SECS) < expires_at =>
            {
                Some(token)
            }
            _ => None,
        }
    }

    fn clear(&mut self) {
        self.token = None;
        self.expires_at = None;
    }
}

/// Owns one account's bearer token.
pub struct TokenSession {
    http: reqwest::Client,
    base_url: Url,
    username: String,
    password: SecretString,
    auth_timeout: Duration,
    clock: Arc<dyn Clock>,
    state: TokenState,
}

impl TokenSession {
    pub fn new(
        http: reqwest::Client,
        base_url: Url,
        username: impl Into<String>,
        password: SecretString,
        auth_timeout: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            http,
            base_url,
            username: username.into(),
            password,
            auth_timeout,
            clock,
            state: TokenState::default(),
        }
    }

    /// The account base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The HTTP client shared with the request layer.
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Expiry of the cached token, if one is held.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.state.expires_at
    }

    /// Whether a token is cached and outside the safety margin right now.
    pub fn has_valid_token(&self) -> bool {
        self.state.usable(self.clock.now()).is_some()
    }

    /// Return a usable bearer token, logging in again when the cached one
    /// is absent or inside the safety margin.
    pub async fn get_token(&mut self) -> Result<SecretString, Error> {
        let now = self.clock.now();
        if let Some(token) = self.state.usable(now) {
            debug!("using cached auth token");
            return Ok(token.clone());
        }

        self.state.clear();
        info!(username = %self.username, "requesting new auth token");

        let token = self.login().await?;
        self.state.token = Some(token.clone());
        self.state.expires_at = Some(now + TimeDelta::seconds(TOKEN_LIFETIME_SECS));
        Ok(token)
    }

    /// Drop the cached token; the next `get_token()` logs in again.
    pub fn invalidate(&mut self) {
        debug!("invalidating cached auth token");
        self.state.clear();
    }

    async fn login(&self) -> Result<SecretString, Error> {
        let url = endpoint_url(&self.base_url, LOGIN_PATH)?;
        debug!("POST {url}");

        let body = json!({
            "username": self.username,
            "password": self.password.expose_secret(),
        });

        let resp = self
            .http
            .post(url)
            .json(&body)
            .timeout(self.auth_timeout)
            .send()
            .await
            .map_err(|e| Error::Authentication {
                status: None,
                message: format!("connection problem during login: {e}"),
            })?;

        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(Error::Authentication {
                status: Some(status.as_u16()),
                message: format!("login rejected: {}", preview(&text)),
            });
        }

        let token = serde_json::from_str::<Value>(&text)
            .ok()
            .and_then(|v| v.get("access_token")?.as_str().map(str::to_owned))
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Error::Authentication {
                status: Some(status.as_u16()),
                message: format!("access_token not found in response: {}", preview(&text)),
            })?;

        debug!("login successful");
        Ok(SecretString::from(token))
    }
}

fn preview(body: &str) -> &str {
    let end = body
        .char_indices()
        .nth(200)
        .map_or(body.len(), |(idx, _)| idx);
    &body[..end]
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    #[test]
    fn empty_state_is_unusable() {
        assert!(TokenState::default().usable(at(0)).is_none());
    }

    #[test]
    fn token_is_usable_until_safety_margin() {
        let state = TokenState {
            token: Some(SecretString::from("tok".to_owned())),
            expires_at: Some(at(1_000)),
        };
        assert!(state.usable(at(939)).is_some());
        assert!(state.usable(at(940)).is_none());
        assert!(state.usable(at(2_000)).is_none());
    }

    #[test]
    fn clear_removes_token_and_expiry() {
        let mut state = TokenState {
            token: Some(SecretString::from("tok".to_owned())),
            expires_at: Some(at(1_000)),
        };
        state.clear();
        assert!(state.token.is_none());
        assert!(state.expires_at.is_none());
    }

    #[test]
    fn preview_truncates_on_char_boundary() {
        let long = "é".repeat(300);
        assert_eq!(preview(&long).chars().count(), 200);
        assert_eq!(preview("short"), "short");
    }
}
