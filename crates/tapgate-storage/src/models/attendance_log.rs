use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tapgate_core::{DeviceId, ScanError, ScanSource};

use crate::error::{StorageError, StorageResult};

/// Attendance log entry recording a single badge scan
///
/// A row is written for every scan that reaches the pipeline, successful or
/// not, so the table doubles as an audit trail. Failed scans carry an
/// `error_code`; successful scans leave it NULL. Rows reference users and
/// devices by their natural keys (`badge_uid`, `device_id`) rather than
/// foreign keys, so a scan from an unregistered badge is still recorded.
///
/// # Fields
///
/// * `id` - Auto-increment primary key
/// * `badge_uid` - Badge UID exactly as reported by the device
/// * `timestamp` - When the scan happened, per the device clock
/// * `device_id` - Which device reported the scan
/// * `code` - `REALTIME` or `OFFLINE_SYNC`; use `source()` for the enum
/// * `error_code` - NULL on success, otherwise a validation outcome
/// * `received_at` - When the row was written, per the server clock
///
/// The dual timestamp strategy matters for offline-synced scans, where
/// `timestamp` can trail `received_at` by hours.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AttendanceLog {
    /// Auto-increment primary key
    pub id: i64,

    /// Badge UID exactly as reported by the device
    pub badge_uid: String,

    /// When the scan happened, per the device clock
    pub timestamp: DateTime<Utc>,

    /// Which device reported the scan
    pub device_id: String,

    /// How the scan reached the server
    ///
    /// Use `source()` to convert to the [`ScanSource`] enum.
    pub code: String,

    /// Validation outcome for failed scans, NULL on success
    ///
    /// Use `error()` to convert to the [`ScanError`] enum.
    pub error_code: Option<String>,

    /// When the row was written, per the server clock
    pub received_at: DateTime<Utc>,
}

impl AttendanceLog {
    /// Create a new attendance log entry for insertion
    ///
    /// `id` and `received_at` are placeholders until the row is written.
    /// The badge UID is taken as a raw string so scans whose UID never
    /// passed badge validation are still recorded verbatim.
    pub fn new(
        badge_uid: &str,
        timestamp: DateTime<Utc>,
        device: &DeviceId,
        source: ScanSource,
        error: Option<ScanError>,
    ) -> Self {
        Self {
            id: 0, // Will be set by database
            badge_uid: badge_uid.to_string(),
            timestamp,
            device_id: device.as_str().to_string(),
            code: source.as_str().to_string(),
            error_code: error.map(|e| e.as_str().to_string()),
            received_at: Utc::now(),
        }
    }

    /// Get the scan source as a [`ScanSource`] enum
    ///
    /// # Errors
    /// Returns `StorageError::Validation` for an unrecognized stored value.
    pub fn source(&self) -> StorageResult<ScanSource> {
        self.code
            .parse()
            .map_err(|_| StorageError::Validation(format!("unknown scan source: {}", self.code)))
    }

    /// Get the error code as a [`ScanError`] enum, if any
    ///
    /// # Errors
    /// Returns `StorageError::Validation` for an unrecognized stored value.
    pub fn error(&self) -> StorageResult<Option<ScanError>> {
        match &self.error_code {
            None => Ok(None),
            Some(code) => code
                .parse()
                .map(Some)
                .map_err(|_| StorageError::Validation(format!("unknown error code: {code}"))),
        }
    }

    /// Check whether this scan passed validation
    pub fn is_success(&self) -> bool {
        self.error_code.is_none()
    }
}

/// Result of an attendance log insert under at-least-once delivery
///
/// Redelivered scans hit the dedup index and report `Duplicate` instead of
/// failing, so the caller can still respond to the device without writing
/// a second row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// A new row was written with this id
    Inserted(i64),
    /// An identical scan was already recorded
    Duplicate,
}

impl InsertOutcome {
    /// Check whether a new row was written
    pub fn is_inserted(&self) -> bool {
        matches!(self, InsertOutcome::Inserted(_))
    }
}
