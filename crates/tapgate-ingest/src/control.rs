//! Device control: optimistic dispatch and acknowledgement handling.
//!
//! A command mutates the device registry twice. [`ControlDispatcher`]
//! applies the intended state the moment the command is issued, so the
//! registry reflects what the fleet has been told to do. [`AckHandler`]
//! re-applies the same transition when the device confirms, which is a
//! no-op when they agree and a correction when a command from elsewhere
//! raced in between. A FAILED acknowledgement never rolls the optimistic
//! state back; it raises an alert for an operator instead, because the
//! true device state at that point is unknowable from here.

use tapgate_bus::MessageBus;
use tapgate_core::{AckStatus, ControlCommand, DeviceId};
use tapgate_protocol::payloads::{ControlAck, ControlMessage};
use tapgate_protocol::topic;
use tapgate_storage::{Database, Device, DeviceRepository, SqliteDeviceRepository, StorageError, transaction};
use tracing::{debug, info, warn};

use crate::error::IngestResult;

/// Result of dispatching a control command.
#[derive(Debug, Clone)]
pub struct ControlOutcome {
    /// Device row after the optimistic state change
    pub device: Device,
    /// Whether the command reached the bus; the state change stands
    /// either way, callers decide whether to retry
    pub mqtt_published: bool,
}

/// Issues admin commands to devices.
#[derive(Debug, Clone)]
pub struct ControlDispatcher<B: MessageBus> {
    bus: B,
    db: Database,
}

impl<B: MessageBus> ControlDispatcher<B> {
    /// Create a new control dispatcher
    pub fn new(bus: B, db: Database) -> Self {
        Self { bus, db }
    }

    /// Dispatch a command to a device.
    ///
    /// Creates the device row if this is the first reference to it,
    /// persists the intended state, then publishes the command. Publish
    /// failure is reported in the outcome, not as an error.
    pub async fn dispatch(
        &self,
        device: &DeviceId,
        command: ControlCommand,
        admin_id: i64,
    ) -> IngestResult<ControlOutcome> {
        let mut tx = self.db.pool().begin().await.map_err(StorageError::from)?;
        transaction::get_or_create_device(&mut tx, device).await?;
        transaction::apply_device_state(&mut tx, device, command.state_change()).await?;
        let updated = transaction::get_or_create_device(&mut tx, device).await?;
        tx.commit().await.map_err(StorageError::from)?;

        info!(
            device = %device,
            command = %command,
            admin_id,
            "Applied optimistic device state for command"
        );

        let message = ControlMessage::new(command, admin_id);
        let topic = topic::control_topic(device);
        let mqtt_published = match self.bus.publish(&topic, message.to_vec()).await {
            Ok(()) => true,
            Err(e) => {
                warn!(device = %device, command = %command, error = %e, "Failed to publish control command");
                false
            }
        };

        Ok(ControlOutcome {
            device: updated,
            mqtt_published,
        })
    }
}

/// Handles command acknowledgements from devices.
#[derive(Debug, Clone)]
pub struct AckHandler {
    db: Database,
}

impl AckHandler {
    /// Create a new acknowledgement handler
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Process one acknowledgement payload from the given device.
    ///
    /// Unknown devices and malformed payloads are dropped with a
    /// diagnostic; a FAILED status is logged as an alert without touching
    /// the registry.
    pub async fn handle(&self, device: &DeviceId, payload: &[u8]) -> IngestResult<()> {
        let ack = match ControlAck::from_slice(payload) {
            Ok(ack) => ack,
            Err(e) => {
                warn!(device = %device, error = %e, "Dropping malformed control acknowledgement");
                return Ok(());
            }
        };

        let devices = SqliteDeviceRepository::new(self.db.pool().clone());
        if devices.find_by_device_id(device).await?.is_none() {
            warn!(device = %device, command = %ack.command, "Dropping acknowledgement from unknown device");
            return Ok(());
        }

        match ack.status {
            AckStatus::Success => {
                let mut tx = self.db.pool().begin().await.map_err(StorageError::from)?;
                transaction::apply_device_state(&mut tx, device, ack.command.state_change())
                    .await?;
                tx.commit().await.map_err(StorageError::from)?;
                debug!(device = %device, command = %ack.command, "Device confirmed command");
            }
            AckStatus::Failed => {
                warn!(
                    device = %device,
                    command = %ack.command,
                    detail = ack.message.as_deref().unwrap_or("none"),
                    "Device reported command failure, registry state may diverge until reconciled"
                );
            }
        }

        Ok(())
    }
}
