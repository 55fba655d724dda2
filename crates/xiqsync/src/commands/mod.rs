//! Command handlers.

pub mod accounts;
pub mod sync;

use xiqsync_config::{Config, ConfigError};

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Load config from `--config` or the default location.
pub(crate) fn load_config(global: &GlobalOpts) -> Result<Config, CliError> {
    xiqsync_config::load_config(global.config.as_deref()).map_err(CliError::from)
}

/// Accounts selected by `--account`, `default_account`, or all.
pub(crate) fn select_accounts<'a>(
    config: &'a Config,
    global: &GlobalOpts,
) -> Result<Vec<(&'a str, &'a xiqsync_config::AccountProfile)>, CliError> {
    config
        .select(global.account.as_deref())
        .map_err(|err| match err {
            ConfigError::NoAccounts => CliError::NoAccounts {
                path: config_location(global),
            },
            other => other.into(),
        })
}

fn config_location(global: &GlobalOpts) -> String {
    global
        .config
        .clone()
        .unwrap_or_else(xiqsync_config::config_path)
        .display()
        .to_string()
}
