//! Topic parsing, building, and subscription filter matching.
//!
//! Every tapgate topic has exactly three `/`-delimited segments:
//! `esp32/<deviceId>/<channel>`. Inbound parsing is strict about the shape
//! and prefix but deliberately loose about the channel name: a message on
//! an unknown channel still identifies its device (the router uses that to
//! refresh last-seen) before being dropped.

use crate::{ProtocolError, Result};
use tapgate_core::DeviceId;

/// Topic prefix shared by all device topics.
pub const TOPIC_PREFIX: &str = "esp32";

/// Channel segment for inbound scan events.
pub const CHANNEL_ATTENDANCE: &str = "attendance";

/// Channel segment for inbound command acknowledgements.
pub const CHANNEL_CONTROL_RESPONSE: &str = "control_response";

/// Channel segment for outbound scan results.
pub const CHANNEL_RESPONSE: &str = "response";

/// Channel segment for outbound commands.
pub const CHANNEL_CONTROL: &str = "control";

/// Inbound channel of a successfully parsed topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Channel {
    /// `attendance` — scan events.
    Attendance,
    /// `control_response` — command acknowledgements.
    ControlResponse,
    /// Any other channel segment. Parsed (so the device is still
    /// identified) but dropped by the router.
    Unknown(String),
}

impl Channel {
    fn from_segment(segment: &str) -> Self {
        match segment {
            CHANNEL_ATTENDANCE => Channel::Attendance,
            CHANNEL_CONTROL_RESPONSE => Channel::ControlResponse,
            other => Channel::Unknown(other.to_string()),
        }
    }
}

/// A parsed inbound topic: originating device plus channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundTopic {
    pub device_id: DeviceId,
    pub channel: Channel,
}

impl InboundTopic {
    /// Parse `esp32/<deviceId>/<channel>`.
    ///
    /// # Errors
    /// Returns `ProtocolError::InvalidTopic` if the topic does not have
    /// exactly three segments, the prefix is not `esp32`, or the device
    /// segment is not a valid [`DeviceId`].
    pub fn parse(topic: &str) -> Result<Self> {
        let mut segments = topic.split('/');
        let (prefix, device, channel) = match (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) {
            (Some(prefix), Some(device), Some(channel), None) => (prefix, device, channel),
            _ => {
                return Err(ProtocolError::InvalidTopic {
                    topic: topic.to_string(),
                    message: "expected exactly 3 segments".to_string(),
                });
            }
        };

        if prefix != TOPIC_PREFIX {
            return Err(ProtocolError::InvalidTopic {
                topic: topic.to_string(),
                message: format!("prefix must be '{TOPIC_PREFIX}', got '{prefix}'"),
            });
        }

        let device_id = DeviceId::new(device).map_err(|e| ProtocolError::InvalidTopic {
            topic: topic.to_string(),
            message: e.to_string(),
        })?;

        Ok(InboundTopic {
            device_id,
            channel: Channel::from_segment(channel),
        })
    }
}

/// Build the outbound scan-result topic for a device.
#[must_use]
pub fn response_topic(device_id: &DeviceId) -> String {
    format!("{TOPIC_PREFIX}/{device_id}/{CHANNEL_RESPONSE}")
}

/// Build the outbound command topic for a device.
#[must_use]
pub fn control_topic(device_id: &DeviceId) -> String {
    format!("{TOPIC_PREFIX}/{device_id}/{CHANNEL_CONTROL}")
}

/// Build the scan-event topic a device publishes on. Used by device
/// emulation and tests; the server only subscribes to the wildcard form.
#[must_use]
pub fn attendance_topic(device_id: &DeviceId) -> String {
    format!("{TOPIC_PREFIX}/{device_id}/{CHANNEL_ATTENDANCE}")
}

/// Subscription pattern with single-level `+` wildcard matching.
///
/// Matching is segment-wise: `+` matches exactly one segment of any
/// content, every other segment must match literally. The multi-level `#`
/// wildcard is not part of this system's vocabulary and is rejected.
///
/// # Examples
///
/// ```
/// use tapgate_protocol::TopicFilter;
///
/// let filter = TopicFilter::attendance();
/// assert!(filter.matches("esp32/device001/attendance"));
/// assert!(!filter.matches("esp32/device001/response"));
/// assert!(!filter.matches("esp32/a/b/attendance"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TopicFilter(String);

impl TopicFilter {
    /// Parse a subscription pattern.
    ///
    /// # Errors
    /// Returns `ProtocolError::InvalidFilter` if the pattern is empty,
    /// contains an empty segment, uses `#`, or uses `+` as part of a
    /// longer segment.
    pub fn parse(pattern: &str) -> Result<Self> {
        if pattern.is_empty() {
            return Err(ProtocolError::InvalidFilter(pattern.to_string()));
        }

        for segment in pattern.split('/') {
            let valid = match segment {
                "" => false,
                "+" => true,
                other => !other.contains(['+', '#']),
            };
            if !valid {
                return Err(ProtocolError::InvalidFilter(pattern.to_string()));
            }
        }

        Ok(TopicFilter(pattern.to_string()))
    }

    /// The filter covering all inbound scan events.
    #[must_use]
    pub fn attendance() -> Self {
        TopicFilter(format!("{TOPIC_PREFIX}/+/{CHANNEL_ATTENDANCE}"))
    }

    /// The filter covering all inbound command acknowledgements.
    #[must_use]
    pub fn control_response() -> Self {
        TopicFilter(format!("{TOPIC_PREFIX}/+/{CHANNEL_CONTROL_RESPONSE}"))
    }

    /// Get the pattern as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check whether a concrete topic matches this filter.
    #[must_use]
    pub fn matches(&self, topic: &str) -> bool {
        let mut pattern = self.0.split('/');
        let mut segments = topic.split('/');

        loop {
            match (pattern.next(), segments.next()) {
                (None, None) => return true,
                (Some("+"), Some(_)) => {}
                (Some(p), Some(s)) if p == s => {}
                _ => return false,
            }
        }
    }
}

impl std::fmt::Display for TopicFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for TopicFilter {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self> {
        TopicFilter::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("esp32/device001/attendance", "device001", Channel::Attendance)]
    #[case(
        "esp32/gate-2/control_response",
        "gate-2",
        Channel::ControlResponse
    )]
    fn test_parse_known_channels(
        #[case] topic: &str,
        #[case] device: &str,
        #[case] channel: Channel,
    ) {
        let parsed = InboundTopic::parse(topic).unwrap();
        assert_eq!(parsed.device_id.as_str(), device);
        assert_eq!(parsed.channel, channel);
    }

    #[test]
    fn test_parse_unknown_channel_still_identifies_device() {
        let parsed = InboundTopic::parse("esp32/device001/telemetry").unwrap();
        assert_eq!(parsed.device_id.as_str(), "device001");
        assert_eq!(parsed.channel, Channel::Unknown("telemetry".to_string()));
    }

    #[rstest]
    #[case("esp32/device001")] // 2 segments
    #[case("esp32/a/b/attendance")] // 4 segments
    #[case("wrong/device001/attendance")] // wrong prefix
    #[case("esp32//attendance")] // empty device segment
    #[case("")]
    fn test_parse_rejects_malformed(#[case] topic: &str) {
        assert!(InboundTopic::parse(topic).is_err());
    }

    #[test]
    fn test_outbound_builders() {
        let device = DeviceId::new("device001").unwrap();
        assert_eq!(response_topic(&device), "esp32/device001/response");
        assert_eq!(control_topic(&device), "esp32/device001/control");
    }

    #[rstest]
    #[case("esp32/+/attendance", "esp32/device001/attendance", true)]
    #[case("esp32/+/attendance", "esp32/x/attendance", true)]
    #[case("esp32/+/attendance", "esp32/device001/response", false)]
    #[case("esp32/+/attendance", "esp32/a/b/attendance", false)]
    #[case("esp32/+/attendance", "other/device001/attendance", false)]
    #[case("esp32/device001/response", "esp32/device001/response", true)]
    #[case("esp32/device001/response", "esp32/device002/response", false)]
    fn test_filter_matching(#[case] pattern: &str, #[case] topic: &str, #[case] expected: bool) {
        let filter = TopicFilter::parse(pattern).unwrap();
        assert_eq!(filter.matches(topic), expected);
    }

    #[rstest]
    #[case("")]
    #[case("esp32//attendance")]
    #[case("esp32/#")]
    #[case("esp32/dev+/attendance")]
    fn test_filter_rejects_invalid_patterns(#[case] pattern: &str) {
        assert!(TopicFilter::parse(pattern).is_err());
    }

    #[test]
    fn test_builtin_filters_cover_their_channels() {
        assert!(TopicFilter::attendance().matches("esp32/any/attendance"));
        assert!(
            TopicFilter::control_response().matches("esp32/any/control_response")
        );
    }
}
