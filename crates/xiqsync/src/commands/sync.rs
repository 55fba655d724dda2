//! `sync` command: fetch devices and merge them into the inventory.

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tabled::Tabled;
use tracing::{debug, warn};

use xiqsync_config::{AccountProfile, Defaults, profile_to_account_config};
use xiqsync_core::{
    Account, CanonicalDevice, Clock, MemoryInventory, SyncOptions, SyncReconciler, SyncReport,
    SystemClock, TlsVerification, TokioSleeper,
};

use crate::cli::{GlobalOpts, SyncArgs};
use crate::error::CliError;
use crate::output;

// ── Output rows ─────────────────────────────────────────────────────

#[derive(Serialize)]
struct SavedDevice<'a> {
    account: &'a str,
    #[serde(flatten)]
    device: &'a CanonicalDevice,
}

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "Account")]
    account: String,
    #[tabled(rename = "Hostname")]
    hostname: String,
    #[tabled(rename = "IP")]
    ip: String,
    #[tabled(rename = "MAC")]
    mac: String,
    #[tabled(rename = "Serial")]
    serial: String,
    #[tabled(rename = "Type")]
    device_type: String,
    #[tabled(rename = "Location")]
    location: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Uptime")]
    uptime: String,
}

fn row(saved: &SavedDevice<'_>, color: bool) -> DeviceRow {
    let d = saved.device;
    DeviceRow {
        account: saved.account.to_owned(),
        hostname: d.hostname.clone(),
        ip: d.ip.clone(),
        mac: d.mac.clone(),
        serial: d.serial.clone(),
        device_type: d.device_type.clone(),
        location: d.location.clone(),
        status: output::status_cell(d.status, color),
        uptime: d.uptime.clone().unwrap_or_else(|| "-".into()),
    }
}

fn summary(report: &SyncReport) -> String {
    let mut line = format!(
        "{}: {} fetched, {} saved",
        report.account,
        report.fetched,
        report.saved.len()
    );
    if report.skipped_no_hostname > 0 {
        line.push_str(&format!(
            ", {} without hostname",
            report.skipped_no_hostname
        ));
    }
    if !report.not_owned.is_empty() {
        line.push_str(&format!(
            ", {} owned by another source",
            report.not_owned.len()
        ));
    }
    if !report.failed.is_empty() {
        line.push_str(&format!(", {} failed", report.failed.len()));
    }
    if !report.is_complete() {
        line.push_str(" (device list incomplete)");
    }
    line
}

// ── State file ──────────────────────────────────────────────────────

fn load_state(path: Option<&Path>) -> Result<MemoryInventory, CliError> {
    let Some(path) = path else {
        return Ok(MemoryInventory::new());
    };
    if !path.exists() {
        debug!(path = %path.display(), "no state file yet, starting empty");
        return Ok(MemoryInventory::new());
    }
    let text = std::fs::read_to_string(path).map_err(|e| CliError::state(path, e))?;
    serde_json::from_str(&text).map_err(|e| CliError::state(path, e))
}

fn save_state(path: &Path, store: &MemoryInventory) -> Result<(), CliError> {
    let text = serde_json::to_string_pretty(store).map_err(|e| CliError::state(path, e))?;
    std::fs::write(path, text).map_err(|e| CliError::state(path, e))
}

// ── Handler ─────────────────────────────────────────────────────────

fn connect(
    name: &str,
    profile: &AccountProfile,
    defaults: &Defaults,
    options: &SyncOptions,
    global: &GlobalOpts,
    clock: &Arc<dyn Clock>,
) -> Result<Account, CliError> {
    let mut config = profile_to_account_config(profile, name, defaults)?;
    if global.insecure {
        config.tls = TlsVerification::DangerAcceptInvalid;
    }
    Account::connect(config, options, clock.clone(), Arc::new(TokioSleeper))
        .map_err(|e| CliError::from_core(e, name))
}

pub async fn handle(args: &SyncArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let config = super::load_config(global)?;
    let selected = super::select_accounts(&config, global)?;

    let mut options = config.sync_options()?;
    if let Some(page_size) = args.page_size {
        options.page_size = page_size;
    }

    let mut store = load_state(args.state.as_deref())?;
    store.reset_seen();

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let mut reconciler = SyncReconciler::new(store, clock.clone()).with_options(&options);
    let mut reports: Vec<SyncReport> = Vec::with_capacity(selected.len());
    let mut failure = None;

    for (name, profile) in selected {
        let mut account = match connect(name, profile, &config.defaults, &options, global, &clock)
        {
            Ok(account) => account,
            Err(err) => {
                failure = Some(err);
                break;
            }
        };
        match reconciler.sync_with_report(&mut account).await {
            Ok(report) => reports.push(report),
            Err(err) => {
                failure = Some(CliError::from_core(err, name));
                break;
            }
        }
    }

    // Keep whatever was merged before a failure.
    if let Some(path) = args.state.as_deref() {
        save_state(path, reconciler.store())?;
    }
    if let Some(err) = failure {
        return Err(err);
    }

    for report in &reports {
        if !report.is_complete() {
            warn!(account = %report.account, "device list was not read to the end");
        }
        if !global.quiet {
            eprintln!("{}", summary(report));
        }
    }

    let saved: Vec<SavedDevice<'_>> = reports
        .iter()
        .flat_map(|r| {
            r.saved.iter().map(|device| SavedDevice {
                account: &r.account,
                device,
            })
        })
        .collect();

    let color = output::should_color(global.color);
    let rendered = output::render_list(
        global.output,
        &saved,
        |s| row(s, color),
        |s| s.device.hostname.clone(),
    )?;
    output::print_output(&rendered, global.quiet);
    Ok(())
}
