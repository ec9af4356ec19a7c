//! Repository traits and their SQLite implementations.
//!
//! Traits use native async methods (Edition 2024), so consumers that need
//! to swap in a test double take a generic parameter rather than a trait
//! object.

pub mod attendance_log;
pub mod device;
pub mod user;

pub use attendance_log::{AttendanceLogRepository, SqliteAttendanceLogRepository};
pub use device::{DeviceRepository, SqliteDeviceRepository};
pub use user::{SqliteUserRepository, UserRepository};
