// Telemetry data domain models
use chrono::NaiveDateTime;
use std::sync::Arc;

/// One expected reading from a tag. Missing fields are lost transmissions.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryRow {
    pub timestamp: NaiveDateTime,
    pub solar_voltage: Option<f64>,
    pub battery_voltage: Option<f64>,
    pub temperature_c: Option<f64>,
    pub displacement_delta_m: Option<f64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl TelemetryRow {
    /// A reading counts as transmitted when the solar voltage came through
    pub fn transmitted(&self) -> bool {
        self.solar_voltage.is_some()
    }

    /// Both coordinates, or nothing
    pub fn position(&self) -> Option<(f64, f64)> {
        self.latitude.zip(self.longitude)
    }
}

/// Rows for one tag in file order
#[derive(Debug, Clone, Default)]
pub struct TelemetryDataset {
    rows: Arc<[TelemetryRow]>,
}

impl TelemetryDataset {
    pub fn new(rows: Vec<TelemetryRow>) -> Self {
        Self { rows: rows.into() }
    }

    pub fn rows(&self) -> &[TelemetryRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Hourly rows starting 2018-03-01 00:00:00, every field present
#[cfg(test)]
pub fn test_rows(count: usize) -> Vec<TelemetryRow> {
    use chrono::{Duration, NaiveDate};

    let base = NaiveDate::from_ymd_opt(2018, 3, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap();
    (0..count)
        .map(|i| TelemetryRow {
            timestamp: base + Duration::hours(i as i64),
            solar_voltage: Some(4.0 + i as f64 * 0.01),
            battery_voltage: Some(3.6),
            temperature_c: Some(20.0 + i as f64),
            displacement_delta_m: Some(i as f64 * 10.0),
            latitude: Some(-19.3 + i as f64 * 0.001),
            longitude: Some(146.7 + i as f64 * 0.001),
        })
        .collect()
}
