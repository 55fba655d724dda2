// ── In-memory inventory ──
//
// Ordered map of host records. Serializable so a caller can keep it in a
// state file between runs.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::InventoryStore;
use crate::error::StoreError;

/// One host as held by [`MemoryInventory`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HostRecord {
    pub hostname: String,
    #[serde(default)]
    pub inventory: IndexMap<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync_id: Option<String>,
    /// Account that owns this host, once claimed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_account: Option<String>,
    #[serde(default)]
    pub seen: bool,
}

impl HostRecord {
    pub fn new(hostname: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            ..Self::default()
        }
    }

    pub fn is_owned_by(&self, account: &str) -> bool {
        self.source_account.as_deref() == Some(account)
    }
}

/// Host inventory kept in memory, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryInventory {
    #[serde(default)]
    hosts: IndexMap<String, HostRecord>,
}

impl MemoryInventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, hostname: &str) -> Option<&HostRecord> {
        self.hosts.get(hostname)
    }

    pub fn hosts(&self) -> impl Iterator<Item = &HostRecord> {
        self.hosts.values()
    }

    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }

    /// Insert or replace a record directly.
    pub fn insert(&mut self, record: HostRecord) {
        self.hosts.insert(record.hostname.clone(), record);
    }

    /// Clear the seen marker on every host before a new import.
    pub fn reset_seen(&mut self) {
        for host in self.hosts.values_mut() {
            host.seen = false;
        }
    }
}

impl InventoryStore for MemoryInventory {
    type Host = HostRecord;

    fn get_or_create_host(&mut self, hostname: &str) -> Result<HostRecord, StoreError> {
        if hostname.is_empty() {
            return Err(StoreError::Load {
                hostname: String::new(),
                reason: "empty hostname".into(),
            });
        }
        Ok(self
            .hosts
            .get(hostname)
            .cloned()
            .unwrap_or_else(|| HostRecord::new(hostname)))
    }

    fn update_inventory(
        &mut self,
        host: &mut HostRecord,
        prefix: &str,
        fields: &IndexMap<String, Value>,
    ) {
        host.inventory.retain(|key, _| !key.starts_with(prefix));
        for (key, value) in fields {
            let key = if key.starts_with(prefix) {
                key.clone()
            } else {
                format!("{prefix}{key}")
            };
            host.inventory.insert(key, value.clone());
        }
    }

    fn set_sync_id(&mut self, host: &mut HostRecord, sync_id: &str) {
        host.sync_id = Some(sync_id.to_owned());
    }

    fn mark_seen(&mut self, host: &mut HostRecord) {
        host.seen = true;
    }

    fn claim_ownership(&mut self, host: &mut HostRecord, account: &str) -> bool {
        match host.source_account.as_deref() {
            None => {
                host.source_account = Some(account.to_owned());
                true
            }
            Some(owner) => owner == account,
        }
    }

    fn save(&mut self, host: HostRecord) -> Result<(), StoreError> {
        debug!(hostname = %host.hostname, fields = host.inventory.len(), "saving host");
        self.insert(host);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(pairs: &[(&str, Value)]) -> IndexMap<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), v.clone()))
            .collect()
    }

    #[test]
    fn unsaved_host_is_not_stored() {
        let mut store = MemoryInventory::new();
        let host = store.get_or_create_host("ap-1").unwrap();
        assert_eq!(host.hostname, "ap-1");
        assert!(store.is_empty());

        store.save(host).unwrap();
        assert_eq!(store.len(), 1);
        assert!(store.get("ap-1").is_some());
    }

    #[test]
    fn empty_hostname_is_rejected() {
        let mut store = MemoryInventory::new();
        assert!(matches!(
            store.get_or_create_host(""),
            Err(StoreError::Load { .. })
        ));
    }

    #[test]
    fn update_inventory_replaces_prefixed_keys_only() {
        let mut store = MemoryInventory::new();
        let mut host = HostRecord::new("ap-1");
        host.inventory.insert("extremecloud_stale".into(), json!(1));
        host.inventory.insert("other_source_vlan".into(), json!(20));

        store.update_inventory(
            &mut host,
            "extremecloud_",
            &fields(&[
                ("hostname", json!("ap-1")),
                ("extremecloud_org_id", json!(0)),
            ]),
        );

        let keys: Vec<&str> = host.inventory.keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            vec![
                "other_source_vlan",
                "extremecloud_hostname",
                "extremecloud_org_id"
            ]
        );
    }

    #[test]
    fn ownership_rules() {
        let mut store = MemoryInventory::new();
        let mut host = HostRecord::new("sw-1");

        assert!(store.claim_ownership(&mut host, "campus"));
        assert!(host.is_owned_by("campus"));
        assert!(store.claim_ownership(&mut host, "campus"));
        assert!(!store.claim_ownership(&mut host, "branch"));
        assert!(host.is_owned_by("campus"));
    }

    #[test]
    fn reset_seen_clears_markers() {
        let mut store = MemoryInventory::new();
        let mut host = store.get_or_create_host("ap-1").unwrap();
        store.mark_seen(&mut host);
        store.set_sync_id(&mut host, "42");
        store.save(host).unwrap();
        assert!(store.get("ap-1").unwrap().seen);

        store.reset_seen();
        let host = store.get("ap-1").unwrap();
        assert!(!host.seen);
        assert_eq!(host.sync_id.as_deref(), Some("42"));
    }

    #[test]
    fn state_round_trips_through_json() {
        let mut store = MemoryInventory::new();
        let mut host = HostRecord::new("ap-1");
        host.source_account = Some("campus".into());
        host.inventory.insert("extremecloud_mac".into(), json!("AA:BB"));
        store.insert(host);

        let text = serde_json::to_string(&store).unwrap();
        let restored: MemoryInventory = serde_json::from_str(&text).unwrap();
        assert_eq!(restored, store);
    }
}
