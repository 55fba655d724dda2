//! Domain model and sync logic between `xiqsync-api` and the local
//! inventory.
//!
//! - **[`normalize`]** maps a raw `/devices` record ([`RawDevice`]) to a
//!   [`CanonicalDevice`]: MAC formatting, [`Uptime`] classification,
//!   first location, status and the allow-listed passthrough fields.
//!
//! - **[`SyncReconciler`]** drains an [`Account`]'s device list and merges
//!   every device with a hostname into an [`InventoryStore`], saving only
//!   hosts the account may own.
//!
//! - **[`MemoryInventory`]** is an ordered, serializable store for callers
//!   without their own inventory backend.
//!
//! Configuration is handed in as an [`AccountConfig`]; this crate never
//! reads config files.

pub mod config;
pub mod convert;
pub mod error;
pub mod model;
pub mod store;
pub mod sync;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{AccountConfig, DEFAULT_API_URL, SyncOptions, TlsVerification};
pub use convert::{INVENTORY_PREFIX, MANUFACTURER, PASSTHROUGH_FIELDS, format_mac, normalize};
pub use error::{CoreError, StoreError};
pub use model::{CanonicalDevice, DeviceStatus, RawDevice, Uptime};
pub use store::{HostRecord, InventoryStore, MemoryInventory};
pub use sync::{Account, SyncReconciler, SyncReport};

pub use xiqsync_api::{Clock, RetryPolicy, Sleeper, SweepEnd, SystemClock, TokioSleeper};
