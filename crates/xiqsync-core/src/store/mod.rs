// ── Inventory store seam ──
//
// The reconciler only talks to the local inventory through this trait.
// Physical persistence belongs to the implementation.

pub mod memory;

use indexmap::IndexMap;
use serde_json::Value;

use crate::error::StoreError;

pub use memory::{HostRecord, MemoryInventory};

/// Local host inventory, keyed by hostname.
///
/// A host handle is fetched (or created unsaved), mutated, and written back
/// with [`save`](Self::save). Nothing is persisted for a handle that is
/// never saved.
pub trait InventoryStore {
    type Host;

    /// Existing host, or a new unsaved one.
    fn get_or_create_host(&mut self, hostname: &str) -> Result<Self::Host, StoreError>;

    /// Replace every inventory key starting with `prefix` by `fields`.
    ///
    /// Keys in `fields` lacking the prefix get it prepended.
    fn update_inventory(
        &mut self,
        host: &mut Self::Host,
        prefix: &str,
        fields: &IndexMap<String, Value>,
    );

    fn set_sync_id(&mut self, host: &mut Self::Host, sync_id: &str);

    /// Flag the host as present in the current import.
    fn mark_seen(&mut self, host: &mut Self::Host);

    /// Ask whether `account` may own this host; records the claim when granted.
    fn claim_ownership(&mut self, host: &mut Self::Host, account: &str) -> bool;

    fn save(&mut self, host: Self::Host) -> Result<(), StoreError>;
}
