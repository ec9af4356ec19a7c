//! Work-day reporting over persisted attendance logs.
//!
//! The arithmetic lives in [`tapgate_core::workday`] as a pure function;
//! this crate supplies the storage-facing half: fetch one badge's scans
//! for one calendar day, in ascending order, and reduce them to a
//! [`WorkDaySummary`].

use chrono::NaiveDate;
use tapgate_core::BadgeId;
use tapgate_core::workday::{self, ScanEntry, WorkDaySummary};
use tapgate_storage::{
    AttendanceLogRepository, Database, SqliteAttendanceLogRepository, StorageError,
};
use thiserror::Error;
use tracing::debug;

/// Errors surfaced by report generation.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Result type alias for reporting operations
pub type ReportResult<T> = Result<T, ReportError>;

/// Generates per-badge work-day summaries.
#[derive(Debug, Clone)]
pub struct WorkDayReporter {
    logs: SqliteAttendanceLogRepository,
}

impl WorkDayReporter {
    /// Create a reporter over the given database
    pub fn new(db: &Database) -> Self {
        Self {
            logs: SqliteAttendanceLogRepository::new(db.pool().clone()),
        }
    }

    /// Summarize one badge's scans for one calendar day.
    ///
    /// The day window is inclusive on both ends, `[00:00:00, 23:59:59.999999]`.
    /// A day with no scans yields the empty summary rather than an error.
    ///
    /// # Errors
    /// Returns an error if the query fails or a stored error code no
    /// longer parses.
    pub async fn aggregate(&self, day: NaiveDate, badge: &BadgeId) -> ReportResult<WorkDaySummary> {
        let from = day
            .and_hms_opt(0, 0, 0)
            .expect("midnight is valid for every date")
            .and_utc();
        let to = day
            .and_hms_micro_opt(23, 59, 59, 999_999)
            .expect("end of day is valid for every date")
            .and_utc();

        let rows = self.logs.find_by_badge_and_range(badge, from, to).await?;
        debug!(badge = %badge, %day, scans = rows.len(), "Aggregating work day");

        let mut entries = Vec::with_capacity(rows.len());
        for row in &rows {
            entries.push(ScanEntry::new(row.timestamp, row.error()?));
        }

        Ok(workday::summarize(&entries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use tapgate_core::workday::DayType;
    use tapgate_core::{DeviceId, ScanError, ScanSource};
    use tapgate_storage::AttendanceLog;

    fn badge() -> BadgeId {
        BadgeId::new("04A1B2C3").unwrap()
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 10).unwrap()
    }

    fn ts(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 10, h, m, 0).unwrap()
    }

    async fn insert(db: &Database, ts: DateTime<Utc>, error: Option<ScanError>) {
        let log = AttendanceLog::new(
            badge().as_str(),
            ts,
            &DeviceId::new("gate-1").unwrap(),
            ScanSource::Realtime,
            error,
        );
        SqliteAttendanceLogRepository::new(db.pool().clone())
            .insert(&log)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_empty_day() {
        let db = Database::in_memory().await.unwrap();
        let reporter = WorkDayReporter::new(&db);

        let summary = reporter.aggregate(day(), &badge()).await.unwrap();
        assert!(summary.times.is_empty());
        assert_eq!(summary.total_hours, 0.0);
        assert_eq!(summary.day_type, DayType::Absent);
        assert!(summary.overtime.is_empty());
    }

    #[tokio::test]
    async fn test_full_day_with_lunch_break() {
        let db = Database::in_memory().await.unwrap();
        let reporter = WorkDayReporter::new(&db);

        for (h, m) in [(8, 0), (12, 0), (13, 0), (17, 30)] {
            insert(&db, ts(h, m), None).await;
        }

        let summary = reporter.aggregate(day(), &badge()).await.unwrap();
        assert_eq!(summary.total_hours, 8.5);
        assert_eq!(summary.day_type, DayType::FullDay);
        assert_eq!(summary.times.len(), 4);
    }

    #[tokio::test]
    async fn test_error_scans_listed_but_not_counted() {
        let db = Database::in_memory().await.unwrap();
        let reporter = WorkDayReporter::new(&db);

        insert(&db, ts(8, 0), None).await;
        insert(&db, ts(9, 0), Some(ScanError::UserNotActive)).await;
        insert(&db, ts(12, 0), None).await;

        let summary = reporter.aggregate(day(), &badge()).await.unwrap();
        assert_eq!(summary.total_hours, 4.0);
        assert_eq!(summary.times.len(), 3);
        assert_eq!(summary.times[1].1, "USER_NOT_ACTIVE");
    }

    #[tokio::test]
    async fn test_scans_outside_the_day_are_excluded() {
        let db = Database::in_memory().await.unwrap();
        let reporter = WorkDayReporter::new(&db);

        insert(&db, ts(8, 0), None).await;
        insert(&db, ts(17, 0), None).await;
        insert(&db, Utc.with_ymd_and_hms(2026, 3, 11, 8, 0, 0).unwrap(), None).await;

        let summary = reporter.aggregate(day(), &badge()).await.unwrap();
        assert_eq!(summary.times.len(), 2);
        assert_eq!(summary.total_hours, 9.0);
    }

    #[tokio::test]
    async fn test_overtime_entries() {
        let db = Database::in_memory().await.unwrap();
        let reporter = WorkDayReporter::new(&db);

        insert(&db, ts(9, 0), None).await;
        insert(&db, ts(19, 0), None).await;

        let summary = reporter.aggregate(day(), &badge()).await.unwrap();
        assert_eq!(summary.overtime.len(), 1);
        assert_eq!(summary.overtime[0].0, "19:00");
        // The overtime entry still appears in the full list.
        assert_eq!(summary.times.len(), 2);
    }

    #[tokio::test]
    async fn test_aggregation_is_idempotent() {
        let db = Database::in_memory().await.unwrap();
        let reporter = WorkDayReporter::new(&db);

        insert(&db, ts(8, 0), None).await;
        insert(&db, ts(12, 30), None).await;

        let first = reporter.aggregate(day(), &badge()).await.unwrap();
        let second = reporter.aggregate(day(), &badge()).await.unwrap();
        assert_eq!(
            serde_json::to_value(&first).unwrap(),
            serde_json::to_value(&second).unwrap()
        );
    }
}
