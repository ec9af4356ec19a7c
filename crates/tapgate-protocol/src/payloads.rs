//! Serde types for the four JSON payloads exchanged with devices.
//!
//! Decoding is strict about required fields and value vocabulary: a scan
//! without `rfid_uid` or `timestamp`, or an acknowledgement whose `status`
//! is neither `SUCCESS` nor `FAILED`, fails deserialization and the
//! message is treated as malformed input upstream. The scan `timestamp`
//! stays a raw string here so the handler can distinguish a missing field
//! from an unparseable instant when logging the drop.

use crate::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tapgate_core::{
    AckStatus, BadgeId, ControlCommand, ScanError, ScanSource, parse_device_timestamp,
};

/// Inbound scan event published by a device on `esp32/<id>/attendance`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanMessage {
    /// Badge UID read from the card.
    pub rfid_uid: String,

    /// Device-reported event time, ISO-8601.
    pub timestamp: String,

    /// Delivery path; devices omit this for live scans.
    #[serde(default)]
    pub code: ScanSource,
}

impl ScanMessage {
    /// Decode from a raw payload.
    ///
    /// # Errors
    /// Returns `ProtocolError::Payload` on invalid JSON or missing fields.
    pub fn from_slice(payload: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(payload)?)
    }

    /// Validate and return the badge identifier.
    ///
    /// # Errors
    /// Returns `ProtocolError::Field` if the UID fails badge validation.
    pub fn badge(&self) -> Result<BadgeId> {
        Ok(BadgeId::new(&self.rfid_uid)?)
    }

    /// Parse the device-reported event time.
    ///
    /// # Errors
    /// Returns `ProtocolError::Field` if the timestamp is unparseable.
    pub fn event_time(&self) -> Result<DateTime<Utc>> {
        Ok(parse_device_timestamp(&self.timestamp)?)
    }

    /// Encode to a JSON payload.
    #[must_use]
    pub fn to_vec(&self) -> Vec<u8> {
        serde_json::to_vec(self).expect("scan message serialization is infallible")
    }
}

/// Outbound scan result published to `esp32/<id>/response`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanResponse {
    /// True when no error code was recorded.
    pub is_success: bool,

    /// Resolved user id, null when the badge did not resolve.
    pub user_id: Option<i64>,

    /// Resolved user display name, null when the badge did not resolve.
    pub user_name: Option<String>,

    /// Echo of the scanned badge UID.
    pub rfid_uid: String,

    /// Business validation outcome, null on success.
    pub error_code: Option<ScanError>,

    /// Server-clock time of day, `HH:MM`.
    pub time_stamp: String,
}

impl ScanResponse {
    /// Build the response for a scan outcome.
    ///
    /// `user` carries the resolved `(id, name)` when the badge resolved;
    /// it is `None` for `USER_NOT_FOUND` and `RFID_DISABLED` outcomes.
    /// The UID is the raw string from the scan, echoed even when it never
    /// passed badge validation.
    #[must_use]
    pub fn new(
        user: Option<(i64, String)>,
        rfid_uid: &str,
        error_code: Option<ScanError>,
        time_stamp: String,
    ) -> Self {
        let (user_id, user_name) = match user {
            Some((id, name)) => (Some(id), Some(name)),
            None => (None, None),
        };
        Self {
            is_success: error_code.is_none(),
            user_id,
            user_name,
            rfid_uid: rfid_uid.to_string(),
            error_code,
            time_stamp,
        }
    }

    /// Decode from a raw payload.
    ///
    /// # Errors
    /// Returns `ProtocolError::Payload` on invalid JSON.
    pub fn from_slice(payload: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(payload)?)
    }

    /// Encode to a JSON payload.
    #[must_use]
    pub fn to_vec(&self) -> Vec<u8> {
        serde_json::to_vec(self).expect("scan response serialization is infallible")
    }
}

/// Outbound command published to `esp32/<id>/control`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlMessage {
    pub command: ControlCommand,

    /// Server time the command was issued.
    pub timestamp: DateTime<Utc>,

    /// Id of the admin who issued the command.
    pub admin_id: i64,
}

impl ControlMessage {
    /// Build a command message stamped with the current server time.
    #[must_use]
    pub fn new(command: ControlCommand, admin_id: i64) -> Self {
        Self {
            command,
            timestamp: Utc::now(),
            admin_id,
        }
    }

    /// Decode from a raw payload.
    ///
    /// # Errors
    /// Returns `ProtocolError::Payload` on invalid JSON.
    pub fn from_slice(payload: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(payload)?)
    }

    /// Encode to a JSON payload.
    #[must_use]
    pub fn to_vec(&self) -> Vec<u8> {
        serde_json::to_vec(self).expect("control message serialization is infallible")
    }
}

/// Inbound command acknowledgement on `esp32/<id>/control_response`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlAck {
    /// The command being acknowledged.
    pub command: ControlCommand,

    /// Whether the device applied the command.
    pub status: AckStatus,

    /// Optional device-supplied detail, surfaced in failure alerts.
    #[serde(default)]
    pub message: Option<String>,
}

impl ControlAck {
    /// Decode from a raw payload.
    ///
    /// # Errors
    /// Returns `ProtocolError::Payload` on invalid JSON, missing fields,
    /// or an unrecognized command/status value.
    pub fn from_slice(payload: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(payload)?)
    }

    /// Encode to a JSON payload.
    #[must_use]
    pub fn to_vec(&self) -> Vec<u8> {
        serde_json::to_vec(self).expect("control ack serialization is infallible")
    }
}
