// Shared fixtures for the wiremock-backed integration tests.
#![allow(dead_code, clippy::unwrap_used)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use futures_util::future::BoxFuture;
use secrecy::SecretString;
use serde_json::{Value, json};
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use xiqsync_api::{Clock, ResilientClient, Sleeper, TransportConfig};

/// A clock that only moves when told to.
#[derive(Clone)]
pub struct ManualClock(Arc<Mutex<DateTime<Utc>>>);

impl ManualClock {
    pub fn new() -> Self {
        Self(Arc::new(Mutex::new(
            DateTime::parse_from_rfc3339("2026-03-01T08:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
        )))
    }

    pub fn advance(&self, by: TimeDelta) {
        *self.0.lock().unwrap() += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap()
    }
}

/// Records requested sleeps and returns immediately.
#[derive(Clone, Default)]
pub struct RecordingSleeper(Arc<Mutex<Vec<Duration>>>);

impl RecordingSleeper {
    pub fn slept(&self) -> Vec<Duration> {
        self.0.lock().unwrap().clone()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) -> BoxFuture<'static, ()> {
        self.0.lock().unwrap().push(duration);
        Box::pin(async {})
    }
}

pub fn secs(n: u64) -> Duration {
    Duration::from_secs(n)
}

pub fn login_body(token: &str) -> Value {
    json!({ "access_token": token, "token_type": "Bearer", "expires_in": 86400 })
}

/// Mount a `/login` mock that hands out `token` and expects `times` calls.
pub async fn mount_login(server: &MockServer, token: &str, times: u64) {
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(login_body(token)))
        .expect(times)
        .mount(server)
        .await;
}

pub fn client_with(
    server: &MockServer,
    transport: &TransportConfig,
    clock: &ManualClock,
    sleeper: &RecordingSleeper,
) -> ResilientClient {
    ResilientClient::connect(
        Url::parse(&server.uri()).unwrap(),
        "ops@example.com",
        SecretString::from("hunter2".to_owned()),
        transport,
        Arc::new(clock.clone()),
        Arc::new(sleeper.clone()),
    )
    .unwrap()
}

pub fn client(server: &MockServer, sleeper: &RecordingSleeper) -> ResilientClient {
    client_with(
        server,
        &TransportConfig::default(),
        &ManualClock::new(),
        sleeper,
    )
}

/// `count` fake device records numbered from `start`.
pub fn devices(start: usize, count: usize) -> Vec<Value> {
    (start..start + count)
        .map(|n| json!({ "id": n, "hostname": format!("ap-{n:04}") }))
        .collect()
}
