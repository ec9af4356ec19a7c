//! Transaction-aware repository operations for atomic multistep writes.
//!
//! These functions accept a SQLite transaction reference, allowing several
//! writes to be grouped into one atomic unit. The ingestion pipeline uses
//! this to keep a scan's log row and the device's state consistent: either
//! everything from one message lands, or nothing does.
//!
//! # Usage Pattern
//!
//! ```no_run
//! use tapgate_storage::{Database, DatabaseConfig};
//! use tapgate_storage::transaction;
//! use tapgate_storage::models::AttendanceLog;
//! use tapgate_core::{BadgeId, DeviceId, ScanSource};
//! use chrono::Utc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::new(DatabaseConfig::new("tapgate.db")).await?;
//!
//! let device = DeviceId::new("gate-1")?;
//! let badge = BadgeId::new("04A1B2C3")?;
//! let log = AttendanceLog::new(badge.as_str(), Utc::now(), &device, ScanSource::Realtime, None);
//!
//! let mut tx = db.pool().begin().await?;
//! transaction::get_or_create_device(&mut tx, &device).await?;
//! transaction::insert_attendance_log(&mut tx, &log).await?;
//! tx.commit().await?;
//! # Ok(())
//! # }
//! ```
//!
//! If any operation returns an error, roll the transaction back by dropping
//! it or calling `rollback()`.

use crate::error::{StorageError, StorageResult};
use crate::models::{AttendanceLog, Device, InsertOutcome, User};
use sqlx::{Sqlite, Transaction};
use tapgate_core::{DeviceId, StateChange};

/// Insert an attendance log within a transaction
///
/// Redeliveries hit the dedup index and report [`InsertOutcome::Duplicate`]
/// without writing a row, same as the pool-backed repository.
pub async fn insert_attendance_log(
    tx: &mut Transaction<'_, Sqlite>,
    log: &AttendanceLog,
) -> StorageResult<InsertOutcome> {
    let result = sqlx::query(
        r#"
        INSERT INTO attendance_logs (badge_uid, timestamp, device_id, code, error_code)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(badge_uid, device_id, timestamp) DO NOTHING
        "#,
    )
    .bind(&log.badge_uid)
    .bind(log.timestamp)
    .bind(&log.device_id)
    .bind(&log.code)
    .bind(&log.error_code)
    .execute(&mut **tx)
    .await?;

    if result.rows_affected() == 0 {
        Ok(InsertOutcome::Duplicate)
    } else {
        Ok(InsertOutcome::Inserted(result.last_insert_rowid()))
    }
}

/// Find a device within a transaction, creating it with defaults if missing
pub async fn get_or_create_device(
    tx: &mut Transaction<'_, Sqlite>,
    device: &DeviceId,
) -> StorageResult<Device> {
    sqlx::query(
        r#"
        INSERT INTO devices (device_id, name)
        VALUES (?, ?)
        ON CONFLICT(device_id) DO NOTHING
        "#,
    )
    .bind(device.as_str())
    .bind(format!("Device {device}"))
    .execute(&mut **tx)
    .await?;

    let row = sqlx::query_as::<_, Device>(
        r#"
        SELECT id, device_id, name, is_active, door_state,
               rfid_enabled, last_seen, created_at
        FROM devices
        WHERE device_id = ?
        "#,
    )
    .bind(device.as_str())
    .fetch_one(&mut **tx)
    .await?;

    Ok(row)
}

/// Apply a device state change within a transaction
pub async fn apply_device_state(
    tx: &mut Transaction<'_, Sqlite>,
    device: &DeviceId,
    change: StateChange,
) -> StorageResult<()> {
    let query = match change {
        StateChange::Door(state) => {
            sqlx::query("UPDATE devices SET door_state = ? WHERE device_id = ?")
                .bind(state.as_str())
        }
        StateChange::Rfid(enabled) => {
            sqlx::query("UPDATE devices SET rfid_enabled = ? WHERE device_id = ?").bind(enabled)
        }
        StateChange::Active(active) => {
            sqlx::query("UPDATE devices SET is_active = ? WHERE device_id = ?").bind(active)
        }
    };

    let result = query.bind(device.as_str()).execute(&mut **tx).await?;

    if result.rows_affected() == 0 {
        return Err(StorageError::not_found("Device", "device_id", device));
    }

    Ok(())
}

/// Create a new user within a transaction
///
/// # Errors
/// Returns an error on a badge or email unique constraint violation, or if
/// the transaction is no longer active.
pub async fn create_user(tx: &mut Transaction<'_, Sqlite>, user: &User) -> StorageResult<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO users (full_name, badge_uid, email, password_hash, is_active, is_admin)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&user.full_name)
    .bind(&user.badge_uid)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(user.is_active)
    .bind(user.is_admin)
    .execute(&mut **tx)
    .await?;

    Ok(result.last_insert_rowid())
}
