// Stacked time-series chart: one panel per measurement, sharing the time axis
use crate::domain::telemetry::TelemetryRow;
use crate::domain::time_range::format_timestamp;
use crate::domain::view::{
    Axis, AxisTitle, ChartDefinition, ChartLayout, LINES_AND_MARKERS, ScatterTrace,
};
use std::collections::BTreeMap;

const CHART_HEIGHT: u32 = 900;
const PANEL_GAP: f64 = 0.04;

struct Panel {
    name: &'static str,
    axis_title: &'static str,
    value: fn(&TelemetryRow) -> Option<f64>,
}

fn displacement(r: &TelemetryRow) -> Option<f64> {
    r.displacement_delta_m
}

fn temperature(r: &TelemetryRow) -> Option<f64> {
    r.temperature_c
}

fn battery(r: &TelemetryRow) -> Option<f64> {
    r.battery_voltage
}

fn solar(r: &TelemetryRow) -> Option<f64> {
    r.solar_voltage
}

/// Top to bottom
const PANELS: [Panel; 4] = [
    Panel {
        name: "Displacement",
        axis_title: "Δd (m)",
        value: displacement,
    },
    Panel {
        name: "Temperature (C)",
        axis_title: "Temp (°C)",
        value: temperature,
    },
    Panel {
        name: "Battery Voltage",
        axis_title: "Vbatt (V)",
        value: battery,
    },
    Panel {
        name: "Solar Voltage",
        axis_title: "Vsolar (V)",
        value: solar,
    },
];

/// Plotly y-axis id for the panel at `index` from the top. The bottom panel owns "y".
fn axis_id(index: usize) -> String {
    match PANELS.len() - index {
        1 => "y".to_string(),
        n => format!("y{}", n),
    }
}

fn layout_key(axis: &str) -> String {
    axis.replacen('y', "yaxis", 1)
}

/// Vertical extent of the panel at `index` from the top
fn panel_domain(index: usize) -> [f64; 2] {
    let count = PANELS.len() as f64;
    let height = (1.0 - PANEL_GAP * (count - 1.0)) / count;
    let from_bottom = (PANELS.len() - 1 - index) as f64;
    let low = from_bottom * (height + PANEL_GAP);
    [low, (low + height).min(1.0)]
}

pub fn build_time_series(rows: &[TelemetryRow]) -> ChartDefinition {
    let x: Vec<String> = rows.iter().map(|r| format_timestamp(&r.timestamp)).collect();

    let data = PANELS
        .iter()
        .enumerate()
        .map(|(i, panel)| ScatterTrace {
            kind: "scatter",
            name: panel.name.to_string(),
            mode: LINES_AND_MARKERS,
            x: x.clone(),
            y: rows
                .iter()
                .map(|r| (panel.value)(r).filter(|v| v.is_finite()))
                .collect(),
            xaxis: "x".to_string(),
            yaxis: axis_id(i),
            connectgaps: false,
        })
        .collect();

    let mut axes = BTreeMap::new();
    axes.insert(
        "xaxis".to_string(),
        Axis {
            title: None,
            domain: [0.0, 1.0],
            anchor: Some("y".to_string()),
        },
    );
    for (i, panel) in PANELS.iter().enumerate() {
        axes.insert(
            layout_key(&axis_id(i)),
            Axis {
                title: Some(AxisTitle {
                    text: panel.axis_title.to_string(),
                }),
                domain: panel_domain(i),
                anchor: Some("x".to_string()),
            },
        );
    }

    ChartDefinition {
        data,
        layout: ChartLayout {
            height: CHART_HEIGHT,
            showlegend: false,
            axes,
        },
    }
}
