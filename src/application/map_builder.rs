// Map track of a tag's GPS fixes
use crate::domain::telemetry::TelemetryRow;
use crate::domain::view::{
    Coordinate, LINES_AND_MARKERS, MapDefinition, MapLayout, MapTrace, Mapbox, Margin, Marker,
};

const MARKER_SIZE: u32 = 9;

/// Camera and credential for the map tiles
#[derive(Debug, Clone)]
pub struct MapSettings {
    pub zoom: f64,
    pub bearing: f64,
    pub access_token: String,
}

/// Median of finite values; mean of the middle pair for even counts
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Only rows with both coordinates contribute, so lat/lon stay paired point by point.
pub fn build_map(rows: &[TelemetryRow], settings: &MapSettings) -> MapDefinition {
    let (lat, lon): (Vec<f64>, Vec<f64>) = rows
        .iter()
        .filter_map(TelemetryRow::position)
        .filter(|(lat, lon)| lat.is_finite() && lon.is_finite())
        .unzip();

    let center = median(&lat)
        .zip(median(&lon))
        .map(|(lat, lon)| Coordinate { lat, lon });

    MapDefinition {
        data: vec![MapTrace {
            kind: "scattermapbox",
            mode: LINES_AND_MARKERS,
            lat,
            lon,
            marker: Marker { size: MARKER_SIZE },
        }],
        layout: MapLayout {
            autosize: true,
            mapbox: Mapbox {
                accesstoken: settings.access_token.clone(),
                bearing: settings.bearing,
                center,
                pitch: 0.0,
                zoom: settings.zoom,
            },
            margin: Margin {
                l: 0,
                r: 0,
                t: 0,
                b: 0,
            },
        },
    }
}
