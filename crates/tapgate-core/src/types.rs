use crate::{
    Result,
    constants::{
        MAX_BADGE_LENGTH, MAX_DEVICE_ID_LENGTH, MIN_BADGE_LENGTH, MIN_DEVICE_ID_LENGTH,
    },
    error::Error,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Device identifier (free-form string chosen by the device or operator).
///
/// Appears as the middle segment of every bus topic, so it must be a
/// single valid topic level: non-empty, ASCII, and free of the `/`, `+`
/// and `#` topic metacharacters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(String);

impl DeviceId {
    /// Create a new device ID with validation.
    ///
    /// The identifier is trimmed before validation.
    ///
    /// # Errors
    /// Returns `Error::InvalidDeviceId` if the identifier is empty, longer
    /// than [`MAX_DEVICE_ID_LENGTH`], non-ASCII, or contains a topic
    /// metacharacter.
    pub fn new(id: &str) -> Result<Self> {
        let id = id.trim();

        let len = id.len();
        if !(MIN_DEVICE_ID_LENGTH..=MAX_DEVICE_ID_LENGTH).contains(&len) {
            return Err(Error::InvalidDeviceId(format!(
                "length must be {MIN_DEVICE_ID_LENGTH}-{MAX_DEVICE_ID_LENGTH}, got {len}"
            )));
        }

        if !id.is_ascii() {
            return Err(Error::InvalidDeviceId("must be ASCII".to_string()));
        }

        if id.contains(['/', '+', '#']) {
            return Err(Error::InvalidDeviceId(format!(
                "'{id}' contains a topic metacharacter"
            )));
        }

        Ok(DeviceId(id.to_string()))
    }

    /// Get the raw identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for DeviceId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        DeviceId::new(s)
    }
}

/// Badge identifier (RFID UID reported by the reader).
///
/// Lookups against the user store are exact, so the value is preserved
/// byte for byte; not even surrounding whitespace is stripped.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BadgeId(String);

impl BadgeId {
    /// Create a new badge ID with validation.
    ///
    /// # Errors
    /// Returns `Error::InvalidBadgeId` if the value is empty, longer than
    /// [`MAX_BADGE_LENGTH`], or not ASCII.
    pub fn new(uid: &str) -> Result<Self> {
        let len = uid.len();
        if !(MIN_BADGE_LENGTH..=MAX_BADGE_LENGTH).contains(&len) {
            return Err(Error::InvalidBadgeId(format!(
                "length must be {MIN_BADGE_LENGTH}-{MAX_BADGE_LENGTH}, got {len}"
            )));
        }

        if !uid.is_ascii() {
            return Err(Error::InvalidBadgeId("must be ASCII".to_string()));
        }

        Ok(BadgeId(uid.to_string()))
    }

    /// Get the badge UID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BadgeId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for BadgeId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        BadgeId::new(s)
    }
}

/// Door state of an access device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DoorState {
    Open,
    Closed,
}

impl DoorState {
    /// Wire/storage representation of this state.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            DoorState::Open => "OPEN",
            DoorState::Closed => "CLOSED",
        }
    }
}

impl fmt::Display for DoorState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for DoorState {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "OPEN" => Ok(DoorState::Open),
            "CLOSED" => Ok(DoorState::Closed),
            _ => Err(Error::UnknownDoorState(s.to_string())),
        }
    }
}

/// How a scan reached the server.
///
/// `Realtime` scans are forwarded as they happen; `OfflineSync` scans were
/// buffered on the device while it had no connectivity and replayed later.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScanSource {
    #[default]
    Realtime,
    OfflineSync,
}

impl ScanSource {
    /// Wire/storage representation of this source.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ScanSource::Realtime => "REALTIME",
            ScanSource::OfflineSync => "OFFLINE_SYNC",
        }
    }
}

impl fmt::Display for ScanSource {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ScanSource {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "REALTIME" => Ok(ScanSource::Realtime),
            "OFFLINE_SYNC" => Ok(ScanSource::OfflineSync),
            _ => Err(Error::UnknownScanSource(s.to_string())),
        }
    }
}

/// Business validation outcome recorded on a failed scan.
///
/// These are expected, non-exceptional outcomes: the scan is still
/// persisted, with this code attached, and echoed back to the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScanError {
    UserNotFound,
    UserNotActive,
    RfidDisabled,
}

impl ScanError {
    /// Wire/storage representation of this error code.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ScanError::UserNotFound => "USER_NOT_FOUND",
            ScanError::UserNotActive => "USER_NOT_ACTIVE",
            ScanError::RfidDisabled => "RFID_DISABLED",
        }
    }
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ScanError {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "USER_NOT_FOUND" => Ok(ScanError::UserNotFound),
            "USER_NOT_ACTIVE" => Ok(ScanError::UserNotActive),
            "RFID_DISABLED" => Ok(ScanError::RfidDisabled),
            _ => Err(Error::UnknownErrorCode(s.to_string())),
        }
    }
}

/// Device acknowledgement status for a control command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AckStatus {
    Success,
    Failed,
}

impl AckStatus {
    #[must_use]
    pub fn is_success(self) -> bool {
        matches!(self, AckStatus::Success)
    }
}

impl fmt::Display for AckStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AckStatus::Success => write!(f, "SUCCESS"),
            AckStatus::Failed => write!(f, "FAILED"),
        }
    }
}

/// The device state field a control command targets, with its new value.
///
/// Both the optimistic write at dispatch time and the confirmed write on
/// acknowledgement apply the same change, which is what makes the two
/// writes idempotent when they agree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateChange {
    /// Door open/closed.
    Door(DoorState),
    /// RFID scanning enabled flag.
    Rfid(bool),
    /// Device active flag.
    Active(bool),
}

/// Admin-initiated command sent to a device over the control topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControlCommand {
    DoorOpen,
    DoorClose,
    RfidEnable,
    RfidDisable,
    DeviceActivate,
    DeviceDeactivate,
}

impl ControlCommand {
    /// Wire representation of this command.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ControlCommand::DoorOpen => "DOOR_OPEN",
            ControlCommand::DoorClose => "DOOR_CLOSE",
            ControlCommand::RfidEnable => "RFID_ENABLE",
            ControlCommand::RfidDisable => "RFID_DISABLE",
            ControlCommand::DeviceActivate => "DEVICE_ACTIVATE",
            ControlCommand::DeviceDeactivate => "DEVICE_DEACTIVATE",
        }
    }

    /// The registry state change this command maps to.
    #[must_use]
    pub fn state_change(self) -> StateChange {
        match self {
            ControlCommand::DoorOpen => StateChange::Door(DoorState::Open),
            ControlCommand::DoorClose => StateChange::Door(DoorState::Closed),
            ControlCommand::RfidEnable => StateChange::Rfid(true),
            ControlCommand::RfidDisable => StateChange::Rfid(false),
            ControlCommand::DeviceActivate => StateChange::Active(true),
            ControlCommand::DeviceDeactivate => StateChange::Active(false),
        }
    }
}

impl fmt::Display for ControlCommand {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ControlCommand {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "DOOR_OPEN" => Ok(ControlCommand::DoorOpen),
            "DOOR_CLOSE" => Ok(ControlCommand::DoorClose),
            "RFID_ENABLE" => Ok(ControlCommand::RfidEnable),
            "RFID_DISABLE" => Ok(ControlCommand::RfidDisable),
            "DEVICE_ACTIVATE" => Ok(ControlCommand::DeviceActivate),
            "DEVICE_DEACTIVATE" => Ok(ControlCommand::DeviceDeactivate),
            _ => Err(Error::UnknownCommand(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("device001", "device001")]
    #[case("  gate-2  ", "gate-2")]
    #[case("a", "a")]
    fn test_device_id_valid(#[case] input: &str, #[case] expected: &str) {
        let id: DeviceId = input.parse().unwrap();
        assert_eq!(id.as_str(), expected);
    }

    #[rstest]
    #[case("")] // empty
    #[case("   ")] // whitespace only
    #[case("dev/001")] // topic separator
    #[case("dev+01")] // wildcard
    #[case("dev#01")] // wildcard
    fn test_device_id_invalid(#[case] input: &str) {
        let result: Result<DeviceId> = input.parse();
        assert!(result.is_err());
    }

    #[test]
    fn test_device_id_length_limit() {
        let long = "d".repeat(MAX_DEVICE_ID_LENGTH);
        assert!(DeviceId::new(&long).is_ok());
        let too_long = "d".repeat(MAX_DEVICE_ID_LENGTH + 1);
        assert!(DeviceId::new(&too_long).is_err());
    }

    #[rstest]
    #[case("ABC123456")]
    #[case(" 04ab-cd ")] // whitespace is part of the UID, not noise
    fn test_badge_id_preserved_byte_for_byte(#[case] input: &str) {
        let badge = BadgeId::new(input).unwrap();
        assert_eq!(badge.as_str(), input);
    }

    #[rstest]
    #[case("")]
    #[case("ユーザー")] // non-ASCII
    fn test_badge_id_invalid(#[case] input: &str) {
        assert!(BadgeId::new(input).is_err());
    }

    #[rstest]
    #[case(DoorState::Open, "OPEN")]
    #[case(DoorState::Closed, "CLOSED")]
    fn test_door_state_round_trip(#[case] state: DoorState, #[case] wire: &str) {
        assert_eq!(state.as_str(), wire);
        assert_eq!(wire.parse::<DoorState>().unwrap(), state);
    }

    #[test]
    fn test_scan_source_default_is_realtime() {
        assert_eq!(ScanSource::default(), ScanSource::Realtime);
    }

    #[rstest]
    #[case(ScanSource::Realtime, "REALTIME")]
    #[case(ScanSource::OfflineSync, "OFFLINE_SYNC")]
    fn test_scan_source_round_trip(#[case] source: ScanSource, #[case] wire: &str) {
        assert_eq!(source.as_str(), wire);
        assert_eq!(wire.parse::<ScanSource>().unwrap(), source);
    }

    #[rstest]
    #[case(ScanError::UserNotFound, "USER_NOT_FOUND")]
    #[case(ScanError::UserNotActive, "USER_NOT_ACTIVE")]
    #[case(ScanError::RfidDisabled, "RFID_DISABLED")]
    fn test_scan_error_round_trip(#[case] error: ScanError, #[case] wire: &str) {
        assert_eq!(error.as_str(), wire);
        assert_eq!(wire.parse::<ScanError>().unwrap(), error);
    }

    #[test]
    fn test_scan_error_serde_uses_wire_names() {
        let json = serde_json::to_string(&ScanError::UserNotFound).unwrap();
        assert_eq!(json, "\"USER_NOT_FOUND\"");
    }

    #[rstest]
    #[case(ControlCommand::DoorOpen, StateChange::Door(DoorState::Open))]
    #[case(ControlCommand::DoorClose, StateChange::Door(DoorState::Closed))]
    #[case(ControlCommand::RfidEnable, StateChange::Rfid(true))]
    #[case(ControlCommand::RfidDisable, StateChange::Rfid(false))]
    #[case(ControlCommand::DeviceActivate, StateChange::Active(true))]
    #[case(ControlCommand::DeviceDeactivate, StateChange::Active(false))]
    fn test_command_state_change_mapping(
        #[case] command: ControlCommand,
        #[case] expected: StateChange,
    ) {
        assert_eq!(command.state_change(), expected);
    }

    #[test]
    fn test_command_round_trip() {
        for command in [
            ControlCommand::DoorOpen,
            ControlCommand::DoorClose,
            ControlCommand::RfidEnable,
            ControlCommand::RfidDisable,
            ControlCommand::DeviceActivate,
            ControlCommand::DeviceDeactivate,
        ] {
            assert_eq!(command.as_str().parse::<ControlCommand>().unwrap(), command);
        }
        assert!("REBOOT".parse::<ControlCommand>().is_err());
    }

    #[test]
    fn test_ack_status() {
        assert!(AckStatus::Success.is_success());
        assert!(!AckStatus::Failed.is_success());
        let status: AckStatus = serde_json::from_str("\"FAILED\"").unwrap();
        assert_eq!(status, AckStatus::Failed);
    }
}
