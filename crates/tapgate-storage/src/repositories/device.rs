#![allow(async_fn_in_trait)]

use crate::error::{StorageError, StorageResult};
use crate::models::Device;
use sqlx::SqlitePool;
use tapgate_core::{DeviceId, StateChange};

/// Repository trait for Device entity operations
///
/// Devices self-register: any message on a device's topics is enough to
/// create a row with default state, so `get_or_create` and
/// `touch_last_seen` are the main entry points rather than an explicit
/// `create`.
pub trait DeviceRepository: Send + Sync {
    /// Find a device by its wire-level identifier
    async fn find_by_device_id(&self, device: &DeviceId) -> StorageResult<Option<Device>>;

    /// Find a device by its identifier, creating it with default state if missing
    async fn get_or_create(&self, device: &DeviceId) -> StorageResult<Device>;

    /// Record that a message arrived from this device just now
    ///
    /// Creates the device row if it does not exist yet.
    async fn touch_last_seen(&self, device: &DeviceId) -> StorageResult<()>;

    /// Apply a state change to a device, returning the updated row
    async fn apply_state(&self, device: &DeviceId, change: StateChange) -> StorageResult<Device>;

    /// Rename a device
    async fn rename(&self, device: &DeviceId, name: &str) -> StorageResult<()>;

    /// Get all registered devices ordered by identifier
    async fn list_all(&self) -> StorageResult<Vec<Device>>;
}

/// SQLite implementation of DeviceRepository
#[derive(Debug, Clone)]
pub struct SqliteDeviceRepository {
    pool: SqlitePool,
}

impl SqliteDeviceRepository {
    /// Create a new SQLite device repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

const SELECT_DEVICE: &str = r#"
    SELECT id, device_id, name, is_active, door_state,
           rfid_enabled, last_seen, created_at
    FROM devices
    WHERE device_id = ?
"#;

impl DeviceRepository for SqliteDeviceRepository {
    async fn find_by_device_id(&self, device: &DeviceId) -> StorageResult<Option<Device>> {
        let row = sqlx::query_as::<_, Device>(SELECT_DEVICE)
            .bind(device.as_str())
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    async fn get_or_create(&self, device: &DeviceId) -> StorageResult<Device> {
        sqlx::query(
            r#"
            INSERT INTO devices (device_id, name)
            VALUES (?, ?)
            ON CONFLICT(device_id) DO NOTHING
            "#,
        )
        .bind(device.as_str())
        .bind(format!("Device {device}"))
        .execute(&self.pool)
        .await?;

        let row = sqlx::query_as::<_, Device>(SELECT_DEVICE)
            .bind(device.as_str())
            .fetch_one(&self.pool)
            .await?;

        Ok(row)
    }

    async fn touch_last_seen(&self, device: &DeviceId) -> StorageResult<()> {
        sqlx::query(
            r#"
            INSERT INTO devices (device_id, name, last_seen)
            VALUES (?, ?, datetime('now'))
            ON CONFLICT(device_id) DO UPDATE SET last_seen = datetime('now')
            "#,
        )
        .bind(device.as_str())
        .bind(format!("Device {device}"))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn apply_state(&self, device: &DeviceId, change: StateChange) -> StorageResult<Device> {
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

        let result = query.bind(device.as_str()).execute(&self.pool).await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::not_found("Device", "device_id", device));
        }

        let row = sqlx::query_as::<_, Device>(SELECT_DEVICE)
            .bind(device.as_str())
            .fetch_one(&self.pool)
            .await?;

        Ok(row)
    }

    async fn rename(&self, device: &DeviceId, name: &str) -> StorageResult<()> {
        let result = sqlx::query("UPDATE devices SET name = ? WHERE device_id = ?")
            .bind(name)
            .bind(device.as_str())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::not_found("Device", "device_id", device));
        }

        Ok(())
    }

    async fn list_all(&self) -> StorageResult<Vec<Device>> {
        let rows = sqlx::query_as::<_, Device>(
            r#"
            SELECT id, device_id, name, is_active, door_state,
                   rfid_enabled, last_seen, created_at
            FROM devices
            ORDER BY device_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
