// ── Device sync ──
//
// Drains the device list of one account, normalizes each record and
// merges it into the inventory store, honoring host ownership.

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use xiqsync_api::{Clock, DEVICES_PATH, Paginator, ResilientClient, Sleeper, SweepEnd};

use crate::config::{AccountConfig, SyncOptions};
use crate::convert::{INVENTORY_PREFIX, normalize};
use crate::error::{CoreError, StoreError};
use crate::model::{CanonicalDevice, RawDevice};
use crate::store::InventoryStore;

/// One configured account together with its API client.
///
/// The client owns the account's token, so keeping the `Account` across
/// runs reuses a still-valid token.
pub struct Account {
    config: AccountConfig,
    client: ResilientClient,
}

impl Account {
    /// Wire up the HTTP client for `config`. No network traffic happens here.
    pub fn connect(
        config: AccountConfig,
        options: &SyncOptions,
        clock: Arc<dyn Clock>,
        sleeper: Arc<dyn Sleeper>,
    ) -> Result<Self, CoreError> {
        let client = ResilientClient::connect(
            config.api_url.clone(),
            config.username.clone(),
            config.password.clone(),
            &config.transport(),
            clock,
            sleeper,
        )?
        .with_retry_policy(options.retry);
        Ok(Self { config, client })
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &AccountConfig {
        &self.config
    }

    pub fn client(&self) -> &ResilientClient {
        &self.client
    }

    pub fn client_mut(&mut self) -> &mut ResilientClient {
        &mut self.client
    }
}

/// Result of one account sync.
#[derive(Debug)]
pub struct SyncReport {
    pub account: String,
    /// Raw records returned by the API.
    pub fetched: usize,
    /// Page requests issued.
    pub requests: u32,
    /// Devices persisted, in fetch order.
    pub saved: Vec<CanonicalDevice>,
    pub skipped_no_hostname: usize,
    /// Hostnames owned by another source.
    pub not_owned: Vec<String>,
    /// Hostnames whose store operation failed.
    pub failed: Vec<String>,
    pub end: SweepEnd,
}

impl SyncReport {
    /// Whether the device list was read to the end.
    pub fn is_complete(&self) -> bool {
        self.end.is_complete()
    }
}

enum Outcome {
    Saved,
    NoHostname,
    NotOwned,
    Failed(StoreError),
}

/// Merges fetched devices into an [`InventoryStore`].
pub struct SyncReconciler<S> {
    store: S,
    clock: Arc<dyn Clock>,
    page_size: u32,
    page_delay: Duration,
}

impl<S> SyncReconciler<S>
where
    S: InventoryStore + Send,
    S::Host: Send,
{
    pub fn new(store: S, clock: Arc<dyn Clock>) -> Self {
        let defaults = SyncOptions::default();
        Self {
            store,
            clock,
            page_size: defaults.page_size,
            page_delay: defaults.page_delay,
        }
    }

    /// Apply page size and courtesy delay from `options`.
    pub fn with_options(mut self, options: &SyncOptions) -> Self {
        self.page_size = options.page_size;
        self.page_delay = options.page_delay;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Sync `account` and return the devices that were saved.
    pub async fn sync(&mut self, account: &mut Account) -> Result<Vec<CanonicalDevice>, CoreError> {
        Ok(self.sync_with_report(account).await?.saved)
    }

    /// Sync `account` and return the full report.
    ///
    /// Only an authentication failure is an error. A failed or malformed
    /// page ends the sweep early; devices from earlier pages are still
    /// merged and the report's `end` says why it stopped.
    pub async fn sync_with_report(
        &mut self,
        account: &mut Account,
    ) -> Result<SyncReport, CoreError> {
        info!(account = %account.name(), "starting ExtremeCloud IQ device sync");

        let sweep = Paginator::new(account.client_mut())
            .with_page_delay(self.page_delay)
            .fetch_all::<RawDevice>(DEVICES_PATH, self.page_size)
            .await?;

        if let SweepEnd::Aborted(ref e) = sweep.end {
            error!(
                account = %account.name(),
                fetched = sweep.items.len(),
                "device sweep aborted, syncing partial results: {e}"
            );
        }

        let mut report = SyncReport {
            account: account.name().to_owned(),
            fetched: sweep.items.len(),
            requests: sweep.requests,
            saved: Vec::new(),
            skipped_no_hostname: 0,
            not_owned: Vec::new(),
            failed: Vec::new(),
            end: sweep.end,
        };

        for raw in &sweep.items {
            let device = normalize(raw, self.clock.now());
            match self.reconcile(account.name(), &device) {
                Outcome::Saved => report.saved.push(device),
                Outcome::NoHostname => {
                    warn!(raw = ?raw, "skipping device without hostname");
                    report.skipped_no_hostname += 1;
                }
                Outcome::NotOwned => {
                    info!(
                        hostname = %device.hostname,
                        "object owned by other source, not saved"
                    );
                    report.not_owned.push(device.hostname);
                }
                Outcome::Failed(e) => {
                    error!(hostname = %device.hostname, "inventory update failed: {e}");
                    report.failed.push(device.hostname);
                }
            }
        }

        info!(
            account = %report.account,
            fetched = report.fetched,
            saved = report.saved.len(),
            not_owned = report.not_owned.len(),
            "device sync finished"
        );
        Ok(report)
    }

    fn reconcile(&mut self, account: &str, device: &CanonicalDevice) -> Outcome {
        if !device.has_hostname() {
            return Outcome::NoHostname;
        }
        info!(hostname = %device.hostname, "processing device");

        let mut host = match self.store.get_or_create_host(&device.hostname) {
            Ok(host) => host,
            Err(e) => return Outcome::Failed(e),
        };
        self.store
            .update_inventory(&mut host, INVENTORY_PREFIX, &device.inventory());
        self.store.set_sync_id(&mut host, &device.sync_id);
        self.store.mark_seen(&mut host);

        if !self.store.claim_ownership(&mut host, account) {
            return Outcome::NotOwned;
        }
        match self.store.save(host) {
            Ok(()) => Outcome::Saved,
            Err(e) => Outcome::Failed(e),
        }
    }
}
