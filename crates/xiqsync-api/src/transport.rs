// Shared transport configuration for building the reqwest::Client.
//
// The token session and the resilient client share one HTTP client, so TLS
// policy lives here once. Timeouts are applied per request: the login
// exchange and data calls have different budgets.

use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::error::Error;

/// Default budget for `POST /login`.
pub const AUTH_TIMEOUT: Duration = Duration::from_secs(30);

/// Default budget for data requests.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// TLS verification mode (api-level mirror of core's `TlsVerification`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TlsMode {
    /// Use the system certificate store.
    System,
    /// Use a custom CA certificate from the given PEM file.
    CustomCa(PathBuf),
    /// Accept any certificate.
    DangerAcceptInvalid,
}

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub tls: TlsMode,
    pub auth_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            tls: TlsMode::System,
            auth_timeout: AUTH_TIMEOUT,
            request_timeout: REQUEST_TIMEOUT,
        }
    }
}

impl TransportConfig {
    /// Config with TLS verification switched on or off, default timeouts.
    pub fn with_verify_tls(verify: bool) -> Self {
        Self {
            tls: if verify {
                TlsMode::System
            } else {
                TlsMode::DangerAcceptInvalid
            },
            ..Self::default()
        }
    }

    /// Build a `reqwest::Client` from this config.
    ///
    /// No client-wide timeout is set; callers pick `auth_timeout` or
    /// `request_timeout` per request.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        let mut builder = reqwest::Client::builder()
            .user_agent(concat!("xiqsync/", env!("CARGO_PKG_VERSION")));

        match &self.tls {
            TlsMode::System => {}
            TlsMode::CustomCa(path) => {
                let cert_pem = std::fs::read(path)
                    .map_err(|e| Error::Tls(format!("failed to read CA cert: {e}")))?;
                let cert = reqwest::Certificate::from_pem(&cert_pem)
                    .map_err(|e| Error::Tls(format!("invalid CA cert: {e}")))?;
                builder = builder.add_root_certificate(cert);
            }
            TlsMode::DangerAcceptInvalid => {
                builder = builder.danger_accept_invalid_certs(true);
            }
        }

        builder
            .build()
            .map_err(|e| Error::Tls(format!("failed to build HTTP client: {e}")))
    }
}

/// Join an absolute API path (`/devices`) onto the account base URL,
/// keeping any path prefix the base already carries.
pub(crate) fn endpoint_url(base: &Url, path: &str) -> Result<Url, Error> {
    let base = base.as_str().trim_end_matches('/');
    let path = path.trim_start_matches('/');
    Ok(Url::parse(&format!("{base}/{path}"))?)
}
