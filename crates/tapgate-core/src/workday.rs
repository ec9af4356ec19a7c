//! Work-day aggregation over one badge-holder's daily scan stream.
//!
//! [`summarize`] is a pure reduction: it takes the day's scan entries in
//! ascending timestamp order and produces the rendered entry list, the
//! paired in/out total, the day classification, and the overtime list.
//! Fetching the entries for a calendar date is the report layer's job.
//!
//! # Pairing rules
//!
//! Only entries with no error code participate in hour accumulation. They
//! are paired consecutively in arrival order: the first success is an
//! "in", the second an "out", and so on. A trailing unpaired success
//! contributes no hours but still appears in the rendered entry list.
//! Durations are taken as-is, so an out-before-in pair caused by device
//! clock skew subtracts from the total; callers wanting to detect that
//! must inspect the entries themselves.

use crate::constants::{FULL_DAY_HOURS, OVERTIME_START_HOUR, SUCCESS_LABEL, TIME_OF_DAY_FORMAT};
use crate::types::ScanError;
use chrono::{DateTime, Timelike, Utc};
use serde::{Serialize, Serializer};

/// One scan event as seen by the aggregator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanEntry {
    /// Device-reported event time.
    pub timestamp: DateTime<Utc>,

    /// Validation outcome recorded with the scan; `None` means success.
    pub error: Option<ScanError>,
}

impl ScanEntry {
    /// Create an entry.
    #[must_use]
    pub fn new(timestamp: DateTime<Utc>, error: Option<ScanError>) -> Self {
        Self { timestamp, error }
    }

    /// Status label rendered into summaries: the error code, or `SUCCESS`.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self.error {
            Some(code) => code.as_str(),
            None => SUCCESS_LABEL,
        }
    }

    fn render(&self) -> (String, String) {
        (
            self.timestamp.format(TIME_OF_DAY_FORMAT).to_string(),
            self.label().to_string(),
        )
    }
}

/// Day classification derived from the paired-hour total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayType {
    /// No paired hours (including days with scans but zero paired time).
    Absent,
    /// More than zero but fewer than the full-day threshold of hours.
    HalfDay,
    /// At or above [`FULL_DAY_HOURS`] paired hours.
    FullDay,
}

impl DayType {
    /// Classify a day from its (unrounded) paired-hour total.
    #[must_use]
    pub fn classify(total_hours: f64) -> Self {
        if total_hours >= FULL_DAY_HOURS {
            DayType::FullDay
        } else if total_hours > 0.0 {
            DayType::HalfDay
        } else {
            DayType::Absent
        }
    }

    /// Numeric value used on the wire: 0, 0.5, or 1.
    #[must_use]
    pub fn value(self) -> f64 {
        match self {
            DayType::Absent => 0.0,
            DayType::HalfDay => 0.5,
            DayType::FullDay => 1.0,
        }
    }
}

impl Serialize for DayType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.value())
    }
}

/// Aggregated view of one badge-holder's calendar day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkDaySummary {
    /// Every scan of the day as `(HH:MM, status label)`, in order.
    pub times: Vec<(String, String)>,

    /// Sum of paired in/out durations, rounded to 2 decimal places.
    pub total_hours: f64,

    /// Day classification (0 absent, 0.5 half day, 1 full day).
    #[serde(rename = "type")]
    pub day_type: DayType,

    /// Scans (success or error) at or after 18:00, rendered like `times`.
    pub overtime: Vec<(String, String)>,
}

impl WorkDaySummary {
    /// The summary for a day with no recorded scans.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            times: Vec::new(),
            total_hours: 0.0,
            day_type: DayType::Absent,
            overtime: Vec::new(),
        }
    }
}

impl Default for WorkDaySummary {
    fn default() -> Self {
        Self::empty()
    }
}

/// Reduce one day's scan entries into a [`WorkDaySummary`].
///
/// Entries must already be in ascending timestamp order; the pairing
/// semantics depend on it.
#[must_use]
pub fn summarize(entries: &[ScanEntry]) -> WorkDaySummary {
    if entries.is_empty() {
        return WorkDaySummary::empty();
    }

    let times: Vec<(String, String)> = entries.iter().map(ScanEntry::render).collect();

    let successes: Vec<DateTime<Utc>> = entries
        .iter()
        .filter(|entry| entry.error.is_none())
        .map(|entry| entry.timestamp)
        .collect();

    // Consecutive in/out pairing; an odd trailing success is ignored here.
    let mut total_hours = 0.0;
    for pair in successes.chunks_exact(2) {
        let worked = pair[1] - pair[0];
        total_hours += worked.num_milliseconds() as f64 / 3_600_000.0;
    }

    let day_type = DayType::classify(total_hours);

    let overtime: Vec<(String, String)> = entries
        .iter()
        .filter(|entry| entry.timestamp.hour() >= OVERTIME_START_HOUR)
        .map(ScanEntry::render)
        .collect();

    WorkDaySummary {
        times,
        total_hours: (total_hours * 100.0).round() / 100.0,
        day_type,
        overtime,
    }
}
