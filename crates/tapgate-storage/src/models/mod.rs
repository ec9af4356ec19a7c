//! Database models for the attendance system.
//!
//! Models map directly to table rows via `sqlx::FromRow`. Columns with a
//! constrained vocabulary (door state, scan source, error codes) are stored
//! as raw TEXT and exposed through typed accessors so that a row written by
//! an older schema revision never panics on read.

pub mod attendance_log;
pub mod device;
pub mod user;

pub use attendance_log::{AttendanceLog, InsertOutcome};
pub use device::Device;
pub use user::User;
