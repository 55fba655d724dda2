//! CLI error types with miette diagnostics.
//!
//! Maps core and config errors into user-facing errors with help text.

use std::path::Path;

use miette::Diagnostic;
use thiserror::Error;

use xiqsync_config::ConfigError;
use xiqsync_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────

    #[error("Could not reach ExtremeCloud IQ at {url}")]
    #[diagnostic(
        code(xiqsync::connection_failed),
        help(
            "Check network access and the account's api_url.\n\
             {reason}"
        )
    )]
    ConnectionFailed { url: String, reason: String },

    // ── Authentication ───────────────────────────────────────────────

    #[error("Authentication failed for account '{account}'")]
    #[diagnostic(
        code(xiqsync::auth_failed),
        help(
            "Verify the account's username and password.\n\
             Upstream said: {message}"
        )
    )]
    AuthFailed { account: String, message: String },

    #[error("No credentials configured for account '{account}'")]
    #[diagnostic(
        code(xiqsync::no_credentials),
        help(
            "Set `username` and one of `password_env`, a keyring entry\n\
             (service \"xiqsync\", user \"{account}/password\") or `password`."
        )
    )]
    NoCredentials { account: String },

    // ── API ──────────────────────────────────────────────────────────

    #[error("API error: {message}")]
    #[diagnostic(code(xiqsync::api_error))]
    Api { message: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error("Account '{name}' not found in configuration")]
    #[diagnostic(code(xiqsync::account_not_found), help("Available accounts: {available}"))]
    AccountNotFound { name: String, available: String },

    #[error("No accounts configured")]
    #[diagnostic(
        code(xiqsync::no_accounts),
        help("Add an [accounts.NAME] table to {path}")
    )]
    NoAccounts { path: String },

    #[error("Configuration file not found: {path}")]
    #[diagnostic(code(xiqsync::no_config))]
    NoConfig { path: String },

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(xiqsync::validation))]
    Validation { field: String, reason: String },

    #[error("Configuration error: {message}")]
    #[diagnostic(code(xiqsync::config))]
    Config { message: String },

    // ── Inventory state ──────────────────────────────────────────────

    #[error("Cannot use state file {path}: {reason}")]
    #[diagnostic(code(xiqsync::state))]
    State { path: String, reason: String },
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::AccountNotFound { .. } | Self::NoConfig { .. } => exit_code::NOT_FOUND,
            Self::Validation { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }

    /// Translate a core error raised while syncing `account`.
    pub fn from_core(err: CoreError, account: &str) -> Self {
        match err {
            CoreError::AuthenticationFailed { message, .. } => Self::AuthFailed {
                account: account.into(),
                message,
            },
            CoreError::ConnectionFailed { url, reason } => Self::ConnectionFailed { url, reason },
            CoreError::Api { message, .. } => Self::Api { message },
            CoreError::Config { message } => Self::Config { message },
        }
    }

    pub fn state(path: &Path, reason: impl ToString) -> Self {
        Self::State {
            path: path.display().to_string(),
            reason: reason.to_string(),
        }
    }
}

// ── ConfigError → CliError mapping ──────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::NoCredentials { account } => Self::NoCredentials { account },
            ConfigError::UnknownAccount { name, available } => {
                Self::AccountNotFound { name, available }
            }
            ConfigError::NoAccounts => Self::NoAccounts {
                path: xiqsync_config::config_path().display().to_string(),
            },
            ConfigError::NotFound(path) => Self::NoConfig {
                path: path.display().to_string(),
            },
            ConfigError::Figment(e) => Self::Config {
                message: e.to_string(),
            },
        }
    }
}
