// ── Device uptime ──
//
// The API reports the last boot as an epoch-millisecond timestamp. The
// elapsed time is classified here and only turned into the inventory's
// string form by `render()`.

use std::time::Duration;

use chrono::{DateTime, Utc};

const MS_PER_DAY: i64 = 86_400_000;

/// Longest span that still renders as a day count.
pub const MAX_REPORTED_DAYS: u64 = 2000;

/// Largest representable span, in days.
pub const MAX_SPAN_DAYS: i64 = 999_999_999;

pub const FUTURE_MARKER: &str = "Timestamp is in the future";
pub const OVERFLOW_MARKER: &str = "Uptime too large for timedelta";
pub const OFFLINE_MARKER: &str = "offline";

/// Outcome of deriving uptime from a boot timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Uptime {
    /// Time since boot.
    Elapsed(Duration),
    /// Boot timestamp lies after `now`.
    FutureTimestamp,
    /// Span too large to represent.
    Overflow,
    /// No numeric timestamp.
    Unknown,
}

impl Uptime {
    /// Classify `boot_ms` (epoch milliseconds) relative to `now`.
    ///
    /// Fractional milliseconds are truncated toward zero.
    pub fn since(boot_ms: Option<f64>, now: DateTime<Utc>) -> Self {
        let Some(boot_ms) = boot_ms else {
            return Self::Unknown;
        };
        if !boot_ms.is_finite() {
            return Self::Overflow;
        }
        let Some(boot) = truncate_to_i64(boot_ms) else {
            return if boot_ms > 0.0 {
                Self::FutureTimestamp
            } else {
                Self::Overflow
            };
        };

        let elapsed_ms = match now.timestamp_millis().checked_sub(boot) {
            Some(ms) => ms,
            None if boot < 0 => return Self::Overflow,
            None => return Self::FutureTimestamp,
        };
        if elapsed_ms < 0 {
            return Self::FutureTimestamp;
        }
        if elapsed_ms / MS_PER_DAY > MAX_SPAN_DAYS {
            return Self::Overflow;
        }
        match u64::try_from(elapsed_ms) {
            Ok(ms) => Self::Elapsed(Duration::from_millis(ms)),
            Err(_) => Self::Overflow,
        }
    }

    /// Inventory string, or `None` when unknown.
    ///
    /// Spans over [`MAX_REPORTED_DAYS`] render as `"offline"`.
    pub fn render(&self) -> Option<String> {
        match self {
            Self::Elapsed(elapsed) => {
                let secs = elapsed.as_secs();
                let days = secs / 86_400;
                if days > MAX_REPORTED_DAYS {
                    return Some(OFFLINE_MARKER.to_owned());
                }
                let hours = secs % 86_400 / 3600;
                let minutes = secs % 3600 / 60;
                let seconds = secs % 60;
                Some(format!("{days} days, {hours:02}:{minutes:02}:{seconds:02}"))
            }
            Self::FutureTimestamp => Some(FUTURE_MARKER.to_owned()),
            Self::Overflow => Some(OVERFLOW_MARKER.to_owned()),
            Self::Unknown => None,
        }
    }
}

/// Truncates toward zero; `None` when outside the `i64` range.
#[allow(clippy::cast_possible_truncation, clippy::as_conversions)]
fn truncate_to_i64(value: f64) -> Option<i64> {
    // 2^63 is exactly representable; anything at or above it is out of range.
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    let truncated = value.trunc();
    if (-LIMIT..LIMIT).contains(&truncated) {
        Some(truncated as i64)
    } else {
        None
    }
}
