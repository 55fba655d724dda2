// ── Domain model ──

pub mod device;
pub mod uptime;

pub use device::{CanonicalDevice, DeviceStatus, RawDevice};
pub use uptime::Uptime;
