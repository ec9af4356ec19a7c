//! SQLite persistence for tapgate.
//!
//! The storage layer follows a repository pattern:
//!
//! - [`Database`] — connection pool manager with embedded migrations
//! - [`UserRepository`], [`DeviceRepository`], [`AttendanceLogRepository`]
//!   — data access traits with SQLite implementations
//! - [`transaction`] — transaction-aware operations so each message
//!   handler can scope all of its writes to a single commit-or-rollback
//!   unit
//!
//! # Soft references
//!
//! `attendance_logs.badge_uid` and `attendance_logs.device_id` reference
//! users and devices by natural key without foreign-key enforcement: a
//! log row must survive the deletion of the user or device it names, and
//! must be writable for badges that never resolved to a user at all.
//!
//! # Duplicate deliveries
//!
//! The bus offers at-least-once delivery, so `attendance_logs` carries a
//! unique index over `(badge_uid, device_id, timestamp)` and inserts
//! report [`InsertOutcome::Duplicate`] instead of failing when the same
//! scan is delivered twice.

pub mod connection;
pub mod error;
pub mod models;
pub mod repositories;
pub mod transaction;

pub use connection::{Database, DatabaseConfig};
pub use error::{StorageError, StorageResult};
pub use models::{AttendanceLog, Device, InsertOutcome, User};
pub use repositories::{
    AttendanceLogRepository, DeviceRepository, SqliteAttendanceLogRepository,
    SqliteDeviceRepository, SqliteUserRepository, UserRepository,
};
