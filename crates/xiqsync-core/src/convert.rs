// ── API-to-domain conversion ──
//
// Maps one raw `/devices` record onto a `CanonicalDevice`. Pure apart from
// the `now` instant the caller supplies for uptime.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;

use crate::model::{CanonicalDevice, DeviceStatus, RawDevice, Uptime};

/// Namespace for every inventory key this source writes.
pub const INVENTORY_PREFIX: &str = "extremecloud_";

/// Vendor constant stored on every device.
pub const MANUFACTURER: &str = "extreme_networks";

/// Raw fields copied verbatim when present, as (source key, inventory key).
pub const PASSTHROUGH_FIELDS: &[(&str, &str)] = &[
    ("create_time", "extremecloud_create_time"),
    ("update_time", "extremecloud_update_time"),
    ("org_id", "extremecloud_org_id"),
    ("service_tag", "extremecloud_service_tag"),
    ("device_function", "extremecloud_device_function"),
    ("software_version", "extremecloud_software_version"),
    ("device_admin_state", "extremecloud_device_admin_state"),
    ("last_connect_time", "extremecloud_last_connect_time"),
    ("network_policy_name", "extremecloud_network_policy_name"),
    (
        "primary_ntp_server_address",
        "extremecloud_primary_ntp_server_address",
    ),
    (
        "primary_dns_server_address",
        "extremecloud_primary_dns_server_address",
    ),
    ("subnet_mask", "extremecloud_subnet_mask"),
    ("default_gateway", "extremecloud_default_gateway"),
    ("ipv6_address", "extremecloud_ipv6_address"),
    ("ipv6_netmask", "extremecloud_ipv6_netmask"),
    ("simulated", "extremecloud_simulated"),
    ("display_version", "extremecloud_display_version"),
    ("active_clients", "extremecloud_active_clients"),
    ("location_id", "extremecloud_location_id"),
    ("country_code", "extremecloud_country_code"),
    ("description", "extremecloud_description"),
    ("config_mismatch", "extremecloud_config_mismatch"),
    ("managed_by", "extremecloud_managed_by"),
    ("thread0_eui64", "extremecloud_thread0_eui64"),
    ("thread0_ext_mac", "extremecloud_thread0_ext_mac"),
    ("mgt_vlan", "extremecloud_mgt_vlan"),
    ("visible", "extremecloud_visible"),
];

/// Normalize one raw device record.
pub fn normalize(raw: &RawDevice, now: DateTime<Utc>) -> CanonicalDevice {
    let status = if raw.connected() {
        DeviceStatus::Up
    } else {
        DeviceStatus::Down
    };

    let extra: IndexMap<_, _> = PASSTHROUGH_FIELDS
        .iter()
        .filter_map(|&(source, target)| raw.get(source).map(|v| (target.to_owned(), v.clone())))
        .collect();

    CanonicalDevice {
        hostname: raw.text("hostname"),
        ip: raw.text("ip_address"),
        mac: format_mac(&raw.text("mac_address")),
        serial: raw.text("serial_number"),
        device_type: raw.text("product_type"),
        location: raw.first_location_name(),
        status,
        uptime: Uptime::since(raw.system_up_time(), now).render(),
        manufacturer: MANUFACTURER.to_owned(),
        sync_id: raw.id(),
        extra,
    }
}

/// `aabbccddeeff` becomes `AA:BB:CC:DD:EE:FF`; anything else is only uppercased.
pub fn format_mac(mac: &str) -> String {
    if mac.len() == 12 && mac.bytes().all(|b| b.is_ascii_hexdigit()) {
        let upper = mac.to_ascii_uppercase();
        let pairs: Vec<&str> = (0..12).step_by(2).filter_map(|i| upper.get(i..i + 2)).collect();
        pairs.join(":")
    } else {
        mac.to_uppercase()
    }
}
