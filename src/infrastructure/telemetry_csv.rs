// Parser for the per-tag gapped CSV files
use crate::domain::error::DashboardError;
use crate::domain::telemetry::{TelemetryDataset, TelemetryRow};
use crate::domain::time_range::parse_timestamp;
use serde::Deserialize;
use std::fmt;
use std::io::Read;

/// Columns every gapped file must carry. Others are ignored.
pub const REQUIRED_COLUMNS: [&str; 7] = ["date", "vsolar", "vbatt", "degC", "Δd", "clat", "clng"];

#[derive(Debug, Deserialize)]
struct CsvRecord {
    date: String,
    #[serde(deserialize_with = "csv::invalid_option")]
    vsolar: Option<f64>,
    #[serde(deserialize_with = "csv::invalid_option")]
    vbatt: Option<f64>,
    #[serde(rename = "degC", deserialize_with = "csv::invalid_option")]
    deg_c: Option<f64>,
    #[serde(rename = "Δd", deserialize_with = "csv::invalid_option")]
    delta_d: Option<f64>,
    #[serde(deserialize_with = "csv::invalid_option")]
    clat: Option<f64>,
    #[serde(deserialize_with = "csv::invalid_option")]
    clng: Option<f64>,
}

/// NaN and infinities are lost readings too
fn reading(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

impl CsvRecord {
    fn into_row(self) -> Result<TelemetryRow, DashboardError> {
        Ok(TelemetryRow {
            timestamp: parse_timestamp(&self.date)?,
            solar_voltage: reading(self.vsolar),
            battery_voltage: reading(self.vbatt),
            temperature_c: reading(self.deg_c),
            displacement_delta_m: reading(self.delta_d),
            latitude: reading(self.clat),
            longitude: reading(self.clng),
        })
    }
}

fn at_line(position: Option<&csv::Position>, error: impl fmt::Display) -> DashboardError {
    match position {
        Some(position) => {
            DashboardError::DataShape(format!("line {}: {}", position.line(), error))
        }
        None => DashboardError::DataShape(error.to_string()),
    }
}

pub fn parse_telemetry_csv<R: Read>(reader: R) -> Result<TelemetryDataset, DashboardError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| DashboardError::DataShape(format!("unreadable header: {}", e)))?
        .clone();
    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|column| !headers.iter().any(|h| h == *column))
        .collect();
    if !missing.is_empty() {
        return Err(DashboardError::DataShape(format!(
            "missing columns: {}",
            missing.join(", ")
        )));
    }

    let mut rows = Vec::new();
    let mut record = csv::StringRecord::new();
    while reader
        .read_record(&mut record)
        .map_err(|e| at_line(e.position(), &e))?
    {
        // Quoted cells may span lines, so the record knows where it starts
        let position = record.position();
        let row = record
            .deserialize::<CsvRecord>(Some(&headers))
            .map_err(|e| at_line(position, e))?
            .into_row()
            .map_err(|e| at_line(position, e))?;
        rows.push(row);
    }

    Ok(TelemetryDataset::new(rows))
}
