//! Scan validation and attendance persistence.
//!
//! Validation is ordered and fail-fast: malformed input is dropped before
//! any lookup, an RFID-disabled device short-circuits before the user is
//! resolved, and only then is the badge matched against the user store.
//! Every business outcome from that point on, success or failure, is
//! persisted and answered on the device's response topic. That includes
//! scans whose UID cannot even pass badge validation: the raw string is
//! recorded verbatim with a not-found outcome, the same as any other
//! badge no user wears.

use chrono::Local;
use tapgate_bus::MessageBus;
use tapgate_core::{DeviceId, ScanError, constants::TIME_OF_DAY_FORMAT};
use tapgate_protocol::payloads::{ScanMessage, ScanResponse};
use tapgate_protocol::topic;
use tapgate_storage::{
    AttendanceLog, Database, DeviceRepository, InsertOutcome, SqliteDeviceRepository,
    SqliteUserRepository, StorageError, UserRepository, transaction,
};
use tracing::{debug, info, warn};

use crate::error::IngestResult;

/// Handles inbound scan events for one database and bus pair.
#[derive(Debug, Clone)]
pub struct AttendanceHandler<B: MessageBus> {
    bus: B,
    db: Database,
}

impl<B: MessageBus> AttendanceHandler<B> {
    /// Create a new attendance handler
    pub fn new(bus: B, db: Database) -> Self {
        Self { bus, db }
    }

    /// Process one scan payload from the given device.
    ///
    /// Malformed payloads are dropped with a diagnostic and report `Ok`;
    /// only system faults (storage errors) surface as `Err`. A response
    /// is published for every business outcome, but never when the log
    /// write failed.
    pub async fn handle(&self, device: &DeviceId, payload: &[u8]) -> IngestResult<()> {
        let scan = match ScanMessage::from_slice(payload) {
            Ok(scan) => scan,
            Err(e) => {
                warn!(device = %device, error = %e, "Dropping malformed scan payload");
                return Ok(());
            }
        };

        let uid = scan.rfid_uid.as_str();

        let event_time = match scan.event_time() {
            Ok(ts) => ts,
            Err(e) => {
                warn!(
                    device = %device,
                    badge = uid,
                    timestamp = %scan.timestamp,
                    error = %e,
                    "Dropping scan with unparseable timestamp"
                );
                return Ok(());
            }
        };

        let devices = SqliteDeviceRepository::new(self.db.pool().clone());
        let dev = devices.get_or_create(device).await?;

        if !dev.rfid_enabled {
            // No log row for a disabled reader, only the refusal.
            info!(device = %device, badge = uid, "Scan refused, RFID disabled on device");
            let response =
                ScanResponse::new(None, uid, Some(ScanError::RfidDisabled), time_of_day());
            self.respond(device, &response).await;
            return Ok(());
        }

        // A UID that fails badge validation cannot match any stored user,
        // so it falls straight through to the not-found outcome.
        let user = match scan.badge() {
            Ok(badge) => {
                let users = SqliteUserRepository::new(self.db.pool().clone());
                users.find_by_badge(&badge).await?
            }
            Err(e) => {
                debug!(device = %device, badge = uid, error = %e, "Badge UID failed validation");
                None
            }
        };

        let (resolved, error_code) = match user {
            None => (None, Some(ScanError::UserNotFound)),
            Some(u) if !u.is_active() => (Some((u.id, u.full_name)), Some(ScanError::UserNotActive)),
            Some(u) => (Some((u.id, u.full_name)), None),
        };

        let log = AttendanceLog::new(uid, event_time, device, scan.code, error_code);

        let mut tx = self.db.pool().begin().await.map_err(StorageError::from)?;
        let outcome = transaction::insert_attendance_log(&mut tx, &log).await?;
        tx.commit().await.map_err(StorageError::from)?;

        match outcome {
            InsertOutcome::Inserted(id) => {
                info!(
                    device = %device,
                    badge = uid,
                    log_id = id,
                    error_code = ?error_code,
                    "Recorded attendance scan"
                );
            }
            InsertOutcome::Duplicate => {
                // Redelivery; the device still deserves its answer.
                debug!(device = %device, badge = uid, "Duplicate scan delivery absorbed");
            }
        }

        let response = ScanResponse::new(resolved, uid, error_code, time_of_day());
        self.respond(device, &response).await;

        Ok(())
    }

    async fn respond(&self, device: &DeviceId, response: &ScanResponse) {
        let topic = topic::response_topic(device);
        if let Err(e) = self.bus.publish(&topic, response.to_vec()).await {
            warn!(device = %device, topic = %topic, error = %e, "Failed to publish scan response");
        }
    }
}

/// Server-clock time of day in `HH:MM`
fn time_of_day() -> String {
    Local::now().format(TIME_OF_DAY_FORMAT).to_string()
}
