//! Device-reported timestamp parsing.
//!
//! Field devices report scan times as ISO-8601 strings, normally with a
//! trailing `Z` (`2025-12-24T10:30:00Z`). Devices that lost their RTC sync
//! configuration have been observed to send naive timestamps without an
//! offset; those are interpreted as UTC rather than dropped.

use crate::{Result, error::Error};
use chrono::{DateTime, NaiveDateTime, Utc};

/// Parse a device-reported ISO-8601 timestamp into a UTC instant.
///
/// Accepts RFC 3339 strings with any offset (a literal `Z` means UTC) and
/// falls back to naive `YYYY-MM-DDTHH:MM:SS[.f]` strings, which are taken
/// to be UTC.
///
/// # Errors
/// Returns `Error::InvalidTimestamp` if neither form parses.
///
/// # Examples
///
/// ```
/// use tapgate_core::parse_device_timestamp;
/// use chrono::Timelike;
///
/// let t = parse_device_timestamp("2025-12-24T10:30:00Z").unwrap();
/// assert_eq!(t.hour(), 10);
///
/// // Offset-bearing and naive forms resolve to the same instant
/// let offset = parse_device_timestamp("2025-12-24T12:30:00+02:00").unwrap();
/// let naive = parse_device_timestamp("2025-12-24T10:30:00").unwrap();
/// assert_eq!(offset, naive);
/// ```
pub fn parse_device_timestamp(value: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }

    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|e| Error::InvalidTimestamp {
            value: value.to_string(),
            message: e.to_string(),
        })
}
