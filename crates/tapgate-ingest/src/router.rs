//! Inbound topic routing.
//!
//! Every message that parses to a well-formed `esp32/<device>/<channel>`
//! topic touches the device's last-seen timestamp, even when the channel
//! itself is unrecognized; hearing from a device at all is evidence it is
//! alive. Malformed topics are dropped with a diagnostic and never reach
//! a handler.

use tapgate_bus::{BusMessage, MessageBus};
use tapgate_protocol::topic::{Channel, InboundTopic};
use tapgate_storage::{Database, DeviceRepository, SqliteDeviceRepository};
use tracing::warn;

use crate::attendance::AttendanceHandler;
use crate::control::AckHandler;
use crate::error::IngestResult;

/// Routes inbound bus messages to the per-channel handlers.
#[derive(Debug, Clone)]
pub struct MessageRouter<B: MessageBus> {
    attendance: AttendanceHandler<B>,
    acks: AckHandler,
    devices: SqliteDeviceRepository,
}

impl<B: MessageBus> MessageRouter<B> {
    /// Create a router over the given bus and database
    pub fn new(bus: B, db: Database) -> Self {
        let devices = SqliteDeviceRepository::new(db.pool().clone());
        Self {
            attendance: AttendanceHandler::new(bus, db.clone()),
            acks: AckHandler::new(db),
            devices,
        }
    }

    /// Route one inbound message.
    ///
    /// Unparseable topics and unknown channels report `Ok` after logging;
    /// `Err` means a handler hit a system fault for this message.
    pub async fn route(&self, message: &BusMessage) -> IngestResult<()> {
        let inbound = match InboundTopic::parse(&message.topic) {
            Ok(inbound) => inbound,
            Err(e) => {
                warn!(topic = %message.topic, error = %e, "Dropping message with malformed topic");
                return Ok(());
            }
        };

        self.devices.touch_last_seen(&inbound.device_id).await?;

        match &inbound.channel {
            Channel::Attendance => {
                self.attendance
                    .handle(&inbound.device_id, &message.payload)
                    .await
            }
            Channel::ControlResponse => {
                self.acks.handle(&inbound.device_id, &message.payload).await
            }
            Channel::Unknown(channel) => {
                warn!(
                    device = %inbound.device_id,
                    channel = %channel,
                    "Dropping message on unrecognized channel"
                );
                Ok(())
            }
        }
    }
}
