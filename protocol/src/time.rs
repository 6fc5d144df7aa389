//! # Gateway Timestamps
//!
//! The gateway wants wall-clock time in Asia/Dhaka, formatted
//! `YYYYMMDDHHmmss`, no separators, no zone suffix. It shows up twice in
//! the Initialize request: inside the signed envelope (`datetime`) and in
//! the outer body (`dateTime`), and both must carry the same value.
//!
//! Dhaka has been UTC+6 without daylight saving since 2009, so a fixed
//! offset is all we need. No tz database.

use chrono::{DateTime, FixedOffset, TimeZone, Utc};

use crate::config::{GATEWAY_UTC_OFFSET_SECS, TIMESTAMP_FORMAT};

/// Source of protocol timestamps.
///
/// A trait so tests can pin the clock. Production code uses [`DhakaClock`].
pub trait TimestampProvider: Send + Sync {
    /// Current time as a `YYYYMMDDHHmmss` string in UTC+6.
    fn now(&self) -> String;
}

/// The UTC+6 offset the gateway uses.
pub fn gateway_offset() -> FixedOffset {
    // 6h is well inside chrono's ±24h bound.
    FixedOffset::east_opt(GATEWAY_UTC_OFFSET_SECS).expect("UTC+6 is a valid offset")
}

/// Format any instant as a gateway timestamp.
pub fn format_timestamp<Tz: TimeZone>(instant: &DateTime<Tz>) -> String {
    instant
        .with_timezone(&gateway_offset())
        .format(TIMESTAMP_FORMAT)
        .to_string()
}

/// The system wall clock, rendered in Dhaka time.
#[derive(Clone, Copy, Debug, Default)]
pub struct DhakaClock;

impl TimestampProvider for DhakaClock {
    fn now(&self) -> String {
        format_timestamp(&Utc::now())
    }
}

/// A clock that always returns the same timestamp.
#[derive(Clone, Debug)]
pub struct FixedClock {
    timestamp: String,
}

impl FixedClock {
    /// Pin the clock to an instant.
    pub fn at<Tz: TimeZone>(instant: &DateTime<Tz>) -> Self {
        Self {
            timestamp: format_timestamp(instant),
        }
    }
}

impl TimestampProvider for FixedClock {
    fn now(&self) -> String {
        self.timestamp.clone()
    }
}
