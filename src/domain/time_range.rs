// Time range parsing and the range filter
use crate::domain::error::DashboardError;
use crate::domain::telemetry::TelemetryRow;
use chrono::NaiveDateTime;

/// Display and input format for timestamps
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const ACCEPTED_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Parse a timestamp from the CSV or a text input.
/// A bare date is read as midnight.
pub fn parse_timestamp(value: &str) -> Result<NaiveDateTime, DashboardError> {
    let value = value.trim();
    ACCEPTED_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| {
            chrono::NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .ok_or_else(|| DashboardError::InvalidTimestamp(value.to_string()))
}

pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Open interval (start, end) over row timestamps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl TimeRange {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self { start, end }
    }

    pub fn parse(start: &str, end: &str) -> Result<Self, DashboardError> {
        Ok(Self::new(parse_timestamp(start)?, parse_timestamp(end)?))
    }

    /// Strict on both ends
    pub fn contains(&self, ts: &NaiveDateTime) -> bool {
        self.start < *ts && *ts < self.end
    }

    /// Rows strictly inside the range, in file order. Empty when start >= end.
    pub fn filter(&self, rows: &[TelemetryRow]) -> Vec<TelemetryRow> {
        rows.iter()
            .filter(|row| self.contains(&row.timestamp))
            .cloned()
            .collect()
    }
}
