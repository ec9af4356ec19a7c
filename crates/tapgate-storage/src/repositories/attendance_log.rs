#![allow(async_fn_in_trait)]

use crate::error::StorageResult;
use crate::models::{AttendanceLog, InsertOutcome};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tapgate_core::BadgeId;

/// Repository trait for AttendanceLog entity operations
///
/// Logs are append-only; there are no update or delete operations. The
/// range query drives work-day reporting and returns rows in ascending
/// scan order so in/out pairing works without a re-sort.
pub trait AttendanceLogRepository: Send + Sync {
    /// Insert a scan, reporting whether it was new or a redelivery
    async fn insert(&self, log: &AttendanceLog) -> StorageResult<InsertOutcome>;

    /// Get all scans for a badge within a time range, oldest first
    async fn find_by_badge_and_range(
        &self,
        badge: &BadgeId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> StorageResult<Vec<AttendanceLog>>;

    /// Get the most recent scans across all devices, newest first
    async fn find_recent(&self, limit: i64) -> StorageResult<Vec<AttendanceLog>>;
}

/// SQLite implementation of AttendanceLogRepository
#[derive(Debug, Clone)]
pub struct SqliteAttendanceLogRepository {
    pool: SqlitePool,
}

impl SqliteAttendanceLogRepository {
    /// Create a new SQLite attendance log repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl AttendanceLogRepository for SqliteAttendanceLogRepository {
    async fn insert(&self, log: &AttendanceLog) -> StorageResult<InsertOutcome> {
        // The dedup index on (badge_uid, device_id, timestamp) absorbs
        // redeliveries under at-least-once transport semantics.
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
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            Ok(InsertOutcome::Duplicate)
        } else {
            Ok(InsertOutcome::Inserted(result.last_insert_rowid()))
        }
    }

    async fn find_by_badge_and_range(
        &self,
        badge: &BadgeId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> StorageResult<Vec<AttendanceLog>> {
        let rows = sqlx::query_as::<_, AttendanceLog>(
            r#"
            SELECT id, badge_uid, timestamp, device_id, code, error_code, received_at
            FROM attendance_logs
            WHERE badge_uid = ? AND timestamp >= ? AND timestamp <= ?
            ORDER BY timestamp ASC
            "#,
        )
        .bind(badge.as_str())
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn find_recent(&self, limit: i64) -> StorageResult<Vec<AttendanceLog>> {
        let rows = sqlx::query_as::<_, AttendanceLog>(
            r#"
            SELECT id, badge_uid, timestamp, device_id, code, error_code, received_at
            FROM attendance_logs
            ORDER BY timestamp DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
