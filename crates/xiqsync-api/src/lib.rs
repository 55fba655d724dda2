//! Async client for the ExtremeCloud IQ REST API.
//!
//! Three layers, leaf first:
//!
//! - **[`TokenSession`]**: logs in with username/password and caches the
//!   bearer token for 24 hours, refreshing inside a 60 second margin.
//! - **[`ResilientClient`]**: issues authenticated requests, renewing the
//!   token on 401 and backing off on 429 or transport failures.
//! - **[`Paginator`]**: drains `page`/`limit` list endpoints into a
//!   [`Sweep`], stopping softly on malformed or failed pages.
//!
//! Time is injected through [`Clock`] and [`Sleeper`].

pub mod auth;
pub mod client;
pub mod clock;
pub mod error;
pub mod paginate;
pub mod transport;

pub use auth::{LOGIN_PATH, TokenSession};
pub use client::{ResilientClient, RetryPolicy};
pub use clock::{Clock, Sleeper, SystemClock, TokioSleeper};
pub use error::Error;
pub use paginate::{DEFAULT_PAGE_SIZE, DEVICES_PATH, PAGE_DELAY, Paginator, Sweep, SweepEnd};
pub use transport::{TlsMode, TransportConfig};

pub use reqwest::Method;
