// ── Runtime account configuration ──
//
// These types describe *how* to reach one cloud account. They carry
// credential data and sync tuning, but never touch disk. The CLI (via
// xiqsync-config) constructs an `AccountConfig` and hands it in.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use xiqsync_api::{DEFAULT_PAGE_SIZE, PAGE_DELAY, RetryPolicy, TlsMode, TransportConfig};

/// Public ExtremeCloud IQ endpoint, used when an account names none.
pub const DEFAULT_API_URL: &str = "https://api.extremecloudiq.com";

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification.
    DangerAcceptInvalid,
}

impl TlsVerification {
    pub fn from_verify_flag(verify: bool) -> Self {
        if verify {
            Self::SystemDefaults
        } else {
            Self::DangerAcceptInvalid
        }
    }
}

impl From<&TlsVerification> for TlsMode {
    fn from(tls: &TlsVerification) -> Self {
        match tls {
            TlsVerification::SystemDefaults => Self::System,
            TlsVerification::CustomCa(path) => Self::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => Self::DangerAcceptInvalid,
        }
    }
}

/// Immutable per-run configuration for one cloud account.
#[derive(Debug, Clone)]
pub struct AccountConfig {
    /// Account name; also the ownership key in the inventory store.
    pub name: String,
    /// API base URL (e.g. `https://api.extremecloudiq.com`).
    pub api_url: Url,
    pub username: String,
    pub password: SecretString,
    pub tls: TlsVerification,
}

impl AccountConfig {
    /// Transport settings for this account, with the default timeouts.
    pub fn transport(&self) -> TransportConfig {
        TransportConfig {
            tls: TlsMode::from(&self.tls),
            ..TransportConfig::default()
        }
    }
}

/// Sweep tuning shared by all accounts of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncOptions {
    pub page_size: u32,
    pub page_delay: Duration,
    pub retry: RetryPolicy,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            page_delay: PAGE_DELAY,
            retry: RetryPolicy::default(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn account(tls: TlsVerification) -> AccountConfig {
        AccountConfig {
            name: "campus".into(),
            api_url: DEFAULT_API_URL.parse().unwrap(),
            username: "ops@example.com".into(),
            password: SecretString::from("hunter2".to_owned()),
            tls,
        }
    }

    #[test]
    fn verify_flag_maps_to_tls_strategy() {
        assert_eq!(
            TlsVerification::from_verify_flag(true),
            TlsVerification::SystemDefaults
        );
        assert_eq!(
            TlsVerification::from_verify_flag(false),
            TlsVerification::DangerAcceptInvalid
        );
    }

    #[test]
    fn transport_carries_tls_and_default_timeouts() {
        let transport = account(TlsVerification::CustomCa("/etc/xiq.pem".into())).transport();
        assert_eq!(transport.tls, TlsMode::CustomCa("/etc/xiq.pem".into()));
        assert_eq!(transport.auth_timeout, Duration::from_secs(30));
        assert_eq!(transport.request_timeout, Duration::from_secs(60));
    }

    #[test]
    fn default_sync_options() {
        let opts = SyncOptions::default();
        assert_eq!(opts.page_size, 100);
        assert_eq!(opts.page_delay, Duration::from_secs(3));
        assert_eq!(opts.retry.max_retries, 2);
    }
}
