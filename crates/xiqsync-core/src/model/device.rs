// ── Device domain types ──

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One device record exactly as the `/devices` endpoint returned it.
///
/// Kept untyped: the cloud API adds fields freely and only a handful are
/// interpreted. Accessors apply the lenient reading rules the normalizer
/// relies on.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawDevice(pub Map<String, Value>);

impl RawDevice {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Field rendered as text: strings verbatim, other scalars as their JSON
    /// text, `null` or missing as empty.
    pub fn text(&self, key: &str) -> String {
        self.get(key).map(value_text).unwrap_or_default()
    }

    /// Remote device id, stringified.
    pub fn id(&self) -> String {
        self.text("id")
    }

    /// Truthiness of the `connected` flag.
    pub fn connected(&self) -> bool {
        self.get("connected").is_some_and(truthy)
    }

    /// Last-boot timestamp in epoch milliseconds, when numeric.
    pub fn system_up_time(&self) -> Option<f64> {
        self.get("system_up_time").and_then(Value::as_f64)
    }

    /// Name of the first entry of `locations`, or empty.
    pub fn first_location_name(&self) -> String {
        self.get("locations")
            .and_then(Value::as_array)
            .and_then(|locations| locations.first())
            .and_then(|first| first.get("name"))
            .map(value_text)
            .unwrap_or_default()
    }
}

impl From<Map<String, Value>> for RawDevice {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Reachability derived from the `connected` flag.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DeviceStatus {
    Up,
    Down,
}

/// Normalized device record, ready to merge into the inventory.
///
/// The fixed core fields are always present; `extra` holds the
/// allow-listed passthrough fields, already namespaced, in allow-list order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalDevice {
    pub hostname: String,
    pub ip: String,
    pub mac: String,
    pub serial: String,
    pub device_type: String,
    pub location: String,
    pub status: DeviceStatus,
    /// Rendered uptime, or `None` when the boot timestamp was unusable.
    pub uptime: Option<String>,
    pub manufacturer: String,
    /// Remote record id, used as the host's sync identifier.
    #[serde(skip)]
    pub sync_id: String,
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

impl CanonicalDevice {
    /// Serial number when known, otherwise the hostname.
    pub fn identifier(&self) -> &str {
        if self.serial.is_empty() {
            &self.hostname
        } else {
            &self.serial
        }
    }

    pub fn has_hostname(&self) -> bool {
        !self.hostname.is_empty()
    }

    /// Inventory fields in write order: core fields first, then passthrough.
    pub fn inventory(&self) -> IndexMap<String, Value> {
        let mut fields = IndexMap::with_capacity(9 + self.extra.len());
        fields.insert("hostname".into(), Value::from(self.hostname.as_str()));
        fields.insert("ip".into(), Value::from(self.ip.as_str()));
        fields.insert("mac".into(), Value::from(self.mac.as_str()));
        fields.insert("serial".into(), Value::from(self.serial.as_str()));
        fields.insert("device_type".into(), Value::from(self.device_type.as_str()));
        fields.insert("location".into(), Value::from(self.location.as_str()));
        fields.insert("status".into(), Value::from(self.status.to_string()));
        fields.insert(
            "uptime".into(),
            self.uptime.as_deref().map_or(Value::Null, Value::from),
        );
        fields.insert(
            "manufacturer".into(),
            Value::from(self.manufacturer.as_str()),
        );
        fields.extend(self.extra.iter().map(|(k, v)| (k.clone(), v.clone())));
        fields
    }
}
