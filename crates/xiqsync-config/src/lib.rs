//! Configuration for xiqsync.
//!
//! TOML account profiles merged with `XIQSYNC_` environment variables,
//! password resolution (env var, keyring, plaintext) and translation to
//! `xiqsync_core::AccountConfig` / `SyncOptions`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use xiqsync_core::{AccountConfig, DEFAULT_API_URL, RetryPolicy, SyncOptions, TlsVerification};

/// Keyring service name for stored passwords.
pub const KEYRING_SERVICE: &str = "xiqsync";

/// Prefix of environment variables merged over the file.
pub const ENV_PREFIX: &str = "XIQSYNC_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no credentials configured for account '{account}'")]
    NoCredentials { account: String },

    #[error("account '{name}' not found in config (available: {available})")]
    UnknownAccount { name: String, available: String },

    #[error("no accounts configured")]
    NoAccounts,

    #[error("config file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    /// Account used when none is named on the command line.
    pub default_account: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named cloud accounts, in name order.
    #[serde(default)]
    pub accounts: BTreeMap<String, AccountProfile>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_verify_tls")]
    pub verify_tls: bool,

    #[serde(default = "default_page_size")]
    pub page_size: u32,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Courtesy delay between pages, in seconds.
    #[serde(default = "default_page_delay")]
    pub page_delay: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            verify_tls: default_verify_tls(),
            page_size: default_page_size(),
            max_retries: default_max_retries(),
            page_delay: default_page_delay(),
        }
    }
}

fn default_verify_tls() -> bool {
    true
}
fn default_page_size() -> u32 {
    100
}
fn default_max_retries() -> u32 {
    2
}
fn default_page_delay() -> u64 {
    3
}

/// A named ExtremeCloud IQ account.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct AccountProfile {
    /// API base URL; the public cloud endpoint when omitted.
    pub api_url: Option<String>,

    pub username: Option<String>,

    /// Password (plaintext, prefer keyring or env var).
    pub password: Option<String>,

    /// Environment variable name containing the password.
    pub password_env: Option<String>,

    /// Override the default TLS verification setting.
    pub verify_tls: Option<bool>,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,
}

impl Config {
    /// Profile for `name`.
    pub fn account(&self, name: &str) -> Result<&AccountProfile, ConfigError> {
        self.accounts
            .get(name)
            .ok_or_else(|| ConfigError::UnknownAccount {
                name: name.into(),
                available: self.available(),
            })
    }

    /// Accounts to sync: `name` if given, else `default_account`, else all.
    pub fn select(&self, name: Option<&str>) -> Result<Vec<(&str, &AccountProfile)>, ConfigError> {
        if self.accounts.is_empty() {
            return Err(ConfigError::NoAccounts);
        }
        match name.or(self.default_account.as_deref()) {
            Some(name) => {
                let (key, profile) = self.accounts.get_key_value(name).ok_or_else(|| {
                    ConfigError::UnknownAccount {
                        name: name.into(),
                        available: self.available(),
                    }
                })?;
                Ok(vec![(key.as_str(), profile)])
            }
            None => Ok(self
                .accounts
                .iter()
                .map(|(name, profile)| (name.as_str(), profile))
                .collect()),
        }
    }

    /// Sweep tuning from `[defaults]`.
    pub fn sync_options(&self) -> Result<SyncOptions, ConfigError> {
        if self.defaults.page_size == 0 {
            return Err(ConfigError::Validation {
                field: "defaults.page_size".into(),
                reason: "must be at least 1".into(),
            });
        }
        Ok(SyncOptions {
            page_size: self.defaults.page_size,
            page_delay: Duration::from_secs(self.defaults.page_delay),
            retry: RetryPolicy {
                max_retries: self.defaults.max_retries,
                ..RetryPolicy::default()
            },
        })
    }

    fn available(&self) -> String {
        if self.accounts.is_empty() {
            return "none".into();
        }
        self.accounts
            .keys()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "xiqsync", "xiqsync").map_or_else(
        || PathBuf::from(".xiqsync").join("config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

// ── Config loading ──────────────────────────────────────────────────

/// Load config from `path` (or the default path) merged with environment.
///
/// A missing default file yields an empty config; a missing explicit
/// `path` is an error.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = match path {
        Some(p) if !p.exists() => return Err(ConfigError::NotFound(p.to_path_buf())),
        Some(p) => p.to_path_buf(),
        None => config_path(),
    };

    let config: Config = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(&path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()?;
    Ok(config)
}

// ── Credential resolution ───────────────────────────────────────────

/// Password for `account`: `password_env` variable, then the system
/// keyring (`xiqsync` / `"{account}/password"`), then plaintext.
pub fn resolve_password(
    profile: &AccountProfile,
    account: &str,
) -> Result<SecretString, ConfigError> {
    // 1. Profile's password_env → env var lookup
    if let Some(ref env_name) = profile.password_env {
        if let Ok(val) = std::env::var(env_name) {
            return Ok(SecretString::from(val));
        }
    }

    // 2. System keyring
    if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, &format!("{account}/password")) {
        if let Ok(secret) = entry.get_password() {
            return Ok(SecretString::from(secret));
        }
    }

    // 3. Plaintext in config
    if let Some(ref pw) = profile.password {
        return Ok(SecretString::from(pw.clone()));
    }

    Err(ConfigError::NoCredentials {
        account: account.into(),
    })
}

/// TLS strategy: an explicit `verify_tls = false` wins, then `ca_cert`.
pub fn resolve_tls(profile: &AccountProfile, defaults: &Defaults) -> TlsVerification {
    let verify = profile.verify_tls.unwrap_or(defaults.verify_tls);
    match (verify, &profile.ca_cert) {
        (false, _) => TlsVerification::DangerAcceptInvalid,
        (true, Some(ca)) => TlsVerification::CustomCa(ca.clone()),
        (true, None) => TlsVerification::SystemDefaults,
    }
}

/// Build an `AccountConfig` from a profile.
pub fn profile_to_account_config(
    profile: &AccountProfile,
    account: &str,
    defaults: &Defaults,
) -> Result<AccountConfig, ConfigError> {
    let raw_url = profile.api_url.as_deref().unwrap_or(DEFAULT_API_URL);
    let api_url: url::Url = raw_url.parse().map_err(|_| ConfigError::Validation {
        field: "api_url".into(),
        reason: format!("invalid URL: {raw_url}"),
    })?;

    let username = profile
        .username
        .clone()
        .filter(|u| !u.is_empty())
        .ok_or_else(|| ConfigError::NoCredentials {
            account: account.into(),
        })?;
    let password = resolve_password(profile, account)?;

    Ok(AccountConfig {
        name: account.into(),
        api_url,
        username,
        password,
        tls: resolve_tls(profile, defaults),
    })
}
