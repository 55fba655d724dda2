// Retrying request layer
//
// Every attempt fetches the current token from the session and rebuilds
// the Authorization header, so a 401-triggered invalidation takes effect
// on the very next attempt. 429s and transport failures back off
// exponentially; everything else fails immediately.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::{debug, error, warn};
use url::Url;

use crate::auth::TokenSession;
use crate::clock::{Clock, Sleeper};
use crate::error::Error;
use crate::transport::{TransportConfig, endpoint_url};

/// How many times a request is retried and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt (`2` means up to 3 attempts total).
    pub max_retries: u32,
    /// Delay before the retry following attempt 0; doubles per attempt.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// Backoff after a failed `attempt` (zero-based): 5s, 10s, 20s, ...
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.checked_pow(attempt).unwrap_or(u32::MAX))
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

/// HTTP client for the remote API with token refresh and retry/backoff.
pub struct ResilientClient {
    session: TokenSession,
    retry: RetryPolicy,
    request_timeout: Duration,
    sleeper: Arc<dyn Sleeper>,
}

impl ResilientClient {
    pub fn new(
        session: TokenSession,
        retry: RetryPolicy,
        request_timeout: Duration,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        Self {
            session,
            retry,
            request_timeout,
            sleeper,
        }
    }

    /// Build the HTTP client from `transport` and wire up a fresh token
    /// session for one account. No network traffic happens here.
    pub fn connect(
        base_url: Url,
        username: impl Into<String>,
        password: SecretString,
        transport: &TransportConfig,
        clock: Arc<dyn Clock>,
        sleeper: Arc<dyn Sleeper>,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        let session = TokenSession::new(
            http,
            base_url,
            username,
            password,
            transport.auth_timeout,
            clock,
        );
        Ok(Self::new(
            session,
            RetryPolicy::default(),
            transport.request_timeout,
            sleeper,
        ))
    }

    /// Replace the retry policy.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    pub fn session(&self) -> &TokenSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut TokenSession {
        &mut self.session
    }

    /// Sleep through the injected sleeper (shared with the paginator).
    pub async fn sleep(&self, duration: Duration) {
        self.sleeper.sleep(duration).await;
    }

    /// Issue one logical request, retrying per the [`RetryPolicy`]:
    ///
    /// - 401 with retries left: invalidate the token, retry immediately
    /// - 429 with retries left: back off, retry
    /// - transport failure with retries left: back off, retry
    /// - any other non-2xx, or retries exhausted: [`Error::Request`]
    ///
    /// Login failures while fetching the token are returned as
    /// [`Error::Authentication`] without further attempts.
    pub async fn request(
        &mut self,
        method: Method,
        path: &str,
        query: Option<&[(&str, String)]>,
        body: Option<&Value>,
    ) -> Result<reqwest::Response, Error> {
        let url = endpoint_url(self.session.base_url(), path)?;
        let max_attempts = self.retry.max_attempts();
        let mut attempt: u32 = 0;

        loop {
            let token = self.session.get_token().await?;
            let retries_left = attempt < self.retry.max_retries;
            debug!("{method} {url} (attempt {}/{max_attempts})", attempt + 1);

            let mut builder = self
                .session
                .http()
                .request(method.clone(), url.clone())
                .bearer_auth(token.expose_secret())
                .timeout(self.request_timeout);
            if let Some(query) = query {
                builder = builder.query(query);
            }
            if let Some(body) = body {
                builder = builder.json(body);
            }

            match builder.send().await {
                Ok(resp) if resp.status().is_success() => return Ok(resp),
                Ok(resp) if resp.status() == StatusCode::UNAUTHORIZED && retries_left => {
                    warn!(
                        "received 401 from {path}, renewing token (attempt {}/{max_attempts})",
                        attempt + 1
                    );
                    self.session.invalidate();
                }
                Ok(resp) if resp.status() == StatusCode::TOO_MANY_REQUESTS && retries_left => {
                    let delay = self.retry.backoff(attempt);
                    warn!(
                        "rate limited (429) on {path}, retrying in {}s (attempt {}/{max_attempts})",
                        delay.as_secs(),
                        attempt + 1
                    );
                    self.sleep(delay).await;
                }
                Ok(resp) => {
                    let status = resp.status();
                    let text = resp.text().await.unwrap_or_default();
                    let message = if text.is_empty() {
                        status.to_string()
                    } else {
                        text.chars().take(200).collect()
                    };
                    return Err(Error::Request {
                        method: method.to_string(),
                        path: path.to_owned(),
                        status: Some(status.as_u16()),
                        attempts: attempt + 1,
                        message,
                    });
                }
                Err(e) => {
                    error!(
                        "request to {path} failed (attempt {}/{max_attempts}): {e}",
                        attempt + 1
                    );
                    if !retries_left {
                        return Err(Error::Request {
                            method: method.to_string(),
                            path: path.to_owned(),
                            status: None,
                            attempts: attempt + 1,
                            message: e.to_string(),
                        });
                    }
                    self.sleep(self.retry.backoff(attempt)).await;
                }
            }

            attempt += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_allows_three_attempts() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 2);
        assert_eq!(policy.max_attempts(), 3);
    }

    #[test]
    fn backoff_doubles_from_five_seconds() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(0), Duration::from_secs(5));
        assert_eq!(policy.backoff(1), Duration::from_secs(10));
        assert_eq!(policy.backoff(2), Duration::from_secs(20));
    }

    #[test]
    fn backoff_for_huge_attempt_counts_does_not_panic() {
        let policy = RetryPolicy::default();
        assert!(policy.backoff(64) > policy.backoff(2));
    }
}
