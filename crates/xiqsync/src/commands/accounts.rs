//! `accounts` command: list configured accounts.

use serde::Serialize;
use tabled::Tabled;

use xiqsync_config::resolve_tls;
use xiqsync_core::{DEFAULT_API_URL, TlsVerification};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

#[derive(Debug, Serialize)]
struct AccountView {
    name: String,
    api_url: String,
    username: String,
    tls: &'static str,
    default: bool,
}

#[derive(Tabled)]
struct AccountRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "API URL")]
    api_url: String,
    #[tabled(rename = "Username")]
    username: String,
    #[tabled(rename = "TLS")]
    tls: &'static str,
    #[tabled(rename = "Default")]
    default: &'static str,
}

impl From<&AccountView> for AccountRow {
    fn from(v: &AccountView) -> Self {
        Self {
            name: v.name.clone(),
            api_url: v.api_url.clone(),
            username: v.username.clone(),
            tls: v.tls,
            default: if v.default { "*" } else { "" },
        }
    }
}

fn tls_label(tls: &TlsVerification) -> &'static str {
    match tls {
        TlsVerification::SystemDefaults => "verify",
        TlsVerification::CustomCa(_) => "custom-ca",
        TlsVerification::DangerAcceptInvalid => "insecure",
    }
}

pub fn handle(global: &GlobalOpts) -> Result<(), CliError> {
    let config = super::load_config(global)?;

    let views: Vec<AccountView> = config
        .accounts
        .iter()
        .map(|(name, profile)| AccountView {
            name: name.clone(),
            api_url: profile
                .api_url
                .clone()
                .unwrap_or_else(|| DEFAULT_API_URL.to_owned()),
            username: profile.username.clone().unwrap_or_default(),
            tls: tls_label(&resolve_tls(profile, &config.defaults)),
            default: config.default_account.as_deref() == Some(name.as_str()),
        })
        .collect();

    let rendered = output::render_list(global.output, &views, |v| AccountRow::from(v), |v| {
        v.name.clone()
    })?;
    output::print_output(&rendered, global.quiet);
    Ok(())
}
