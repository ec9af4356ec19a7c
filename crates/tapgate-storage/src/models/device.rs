use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tapgate_core::{DeviceId, DoorState};

use crate::error::{StorageError, StorageResult};

/// Registered badge-scan device and its last known state
///
/// Device rows are created lazily the first time a device identifier shows
/// up on the wire, so the fleet inventory is always a superset of what has
/// actually been heard from. State columns (`door_state`, `rfid_enabled`,
/// `is_active`) track the most recently commanded state; they are updated
/// optimistically when a control command is dispatched and reconciled when
/// the device acknowledges.
///
/// # Fields
///
/// * `id` - Auto-increment primary key
/// * `device_id` - Wire-level device identifier (unique)
/// * `name` - Human-readable label, defaults to `Device <device_id>`
/// * `is_active` - Deactivated devices have their scans rejected upstream
/// * `door_state` - `OPEN` or `CLOSED`; use `door()` for the typed form
/// * `rfid_enabled` - Whether the device's reader should accept badges
/// * `last_seen` - Last time any message arrived on one of its topics
/// * `created_at` - Row creation timestamp
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Device {
    /// Auto-increment primary key
    pub id: i64,

    /// Wire-level device identifier
    ///
    /// Stored as raw TEXT; use `identifier()` for the validated form.
    pub device_id: String,

    /// Human-readable label
    pub name: String,

    /// Whether the device participates in attendance at all
    pub is_active: bool,

    /// Last commanded door position, `OPEN` or `CLOSED`
    ///
    /// Use `door()` to convert to the [`DoorState`] enum.
    pub door_state: String,

    /// Whether the device's reader should accept badges
    pub rfid_enabled: bool,

    /// Last time any message arrived on one of its topics
    ///
    /// NULL for devices provisioned ahead of first contact.
    pub last_seen: Option<DateTime<Utc>>,

    /// Row creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Device {
    /// Get the device identifier as a validated [`DeviceId`]
    ///
    /// # Errors
    /// Returns an error if the stored value no longer satisfies identifier
    /// validation rules (only possible after manual database edits).
    pub fn identifier(&self) -> tapgate_core::Result<DeviceId> {
        DeviceId::new(&self.device_id)
    }

    /// Get the door state as a [`DoorState`] enum
    ///
    /// # Errors
    /// Returns `StorageError::Validation` for an unrecognized stored value.
    pub fn door(&self) -> StorageResult<DoorState> {
        self.door_state
            .parse()
            .map_err(|_| StorageError::Validation(format!("unknown door state: {}", self.door_state)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_device() -> Device {
        Device {
            id: 1,
            device_id: "lab-entrance".to_string(),
            name: "Device lab-entrance".to_string(),
            is_active: true,
            door_state: "CLOSED".to_string(),
            rfid_enabled: true,
            last_seen: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_door_accessor() {
        let mut device = sample_device();
        assert_eq!(device.door().unwrap(), DoorState::Closed);

        device.door_state = "OPEN".to_string();
        assert_eq!(device.door().unwrap(), DoorState::Open);

        device.door_state = "ajar".to_string();
        assert!(matches!(device.door(), Err(StorageError::Validation(_))));
    }

    #[test]
    fn test_identifier_accessor() {
        let device = sample_device();
        assert_eq!(device.identifier().unwrap().as_str(), "lab-entrance");
    }
}
