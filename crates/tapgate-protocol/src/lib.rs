//! Wire contract between tapgate and ESP32 field devices.
//!
//! Devices and server exchange JSON documents over four `/`-delimited,
//! three-segment topics:
//!
//! | Direction | Topic                           | Payload              |
//! |-----------|---------------------------------|----------------------|
//! | inbound   | `esp32/<deviceId>/attendance`       | [`ScanMessage`]      |
//! | inbound   | `esp32/<deviceId>/control_response` | [`ControlAck`]       |
//! | outbound  | `esp32/<deviceId>/response`         | [`ScanResponse`]     |
//! | outbound  | `esp32/<deviceId>/control`          | [`ControlMessage`]   |
//!
//! This crate owns topic parsing/building (including `+` wildcard filter
//! matching used for subscriptions) and the serde types for the four
//! payloads. It performs no I/O and holds no state.

pub mod payloads;
pub mod topic;

pub use payloads::{ControlAck, ControlMessage, ScanMessage, ScanResponse};
pub use topic::{Channel, InboundTopic, TopicFilter, attendance_topic, control_topic, response_topic};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProtocolError {
    /// Topic does not match the `esp32/<deviceId>/<channel>` shape.
    #[error("Invalid topic '{topic}': {message}")]
    InvalidTopic { topic: String, message: String },

    /// Topic filter pattern is not a valid subscription pattern.
    #[error("Invalid topic filter '{0}'")]
    InvalidFilter(String),

    /// Payload is not valid JSON or is missing required fields.
    #[error("Invalid payload: {0}")]
    Payload(#[from] serde_json::Error),

    /// A payload field failed domain validation.
    #[error(transparent)]
    Field(#[from] tapgate_core::Error),
}

pub type Result<T> = std::result::Result<T, ProtocolError>;
