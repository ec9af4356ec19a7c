//! Core constants shared across the tapgate workspace.
//!
//! Centralizes identifier limits, topic vocabulary referenced by every
//! crate, and the work-day classification thresholds so the aggregation
//! rules live in exactly one place.

// ============================================================================
// Identifier Constraints
// ============================================================================

/// Minimum device identifier length (characters).
///
/// Device identifiers are free-form strings chosen by the device or the
/// operator; an empty identifier is never valid.
pub const MIN_DEVICE_ID_LENGTH: usize = 1;

/// Maximum device identifier length (characters).
///
/// Keeps topic strings bounded; identifiers longer than this are rejected.
pub const MAX_DEVICE_ID_LENGTH: usize = 64;

/// Minimum badge identifier length (characters).
pub const MIN_BADGE_LENGTH: usize = 1;

/// Maximum badge identifier length (characters).
///
/// Matches the column width reserved for badge UIDs in storage.
pub const MAX_BADGE_LENGTH: usize = 50;

// ============================================================================
// Work-Day Classification
// ============================================================================

/// Paired hours at or above which a day counts as a full working day.
pub const FULL_DAY_HOURS: f64 = 6.5;

/// Local hour of day (24 h clock) from which scans count as overtime.
pub const OVERTIME_START_HOUR: u32 = 18;

/// Render format for time-of-day strings in responses and summaries.
pub const TIME_OF_DAY_FORMAT: &str = "%H:%M";

// ============================================================================
// Labels
// ============================================================================

/// Status label for a scan that recorded no error code.
pub const SUCCESS_LABEL: &str = "SUCCESS";
