// View models handed to the browser. Chart shapes follow the Plotly figure JSON layout.
use serde::Serialize;
use std::collections::BTreeMap;

pub const LINES_AND_MARKERS: &str = "lines+markers";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterTrace {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub name: String,
    pub mode: &'static str,
    pub x: Vec<String>,
    /// `None` serializes as null so Plotly breaks the line there
    pub y: Vec<Option<f64>>,
    pub xaxis: String,
    pub yaxis: String,
    pub connectgaps: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AxisTitle {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Axis {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<AxisTitle>,
    pub domain: [f64; 2],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anchor: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartLayout {
    pub height: u32,
    pub showlegend: bool,
    /// Keyed by Plotly axis name: "xaxis", "yaxis", "yaxis2", ...
    #[serde(flatten)]
    pub axes: BTreeMap<String, Axis>,
}

/// Stacked time-series figure
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartDefinition {
    pub data: Vec<ScatterTrace>,
    pub layout: ChartLayout,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub size: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapTrace {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub mode: &'static str,
    pub lat: Vec<f64>,
    pub lon: Vec<f64>,
    pub marker: Marker,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Mapbox {
    pub accesstoken: String,
    pub bearing: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub center: Option<Coordinate>,
    pub pitch: f64,
    pub zoom: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Margin {
    pub l: u32,
    pub r: u32,
    pub t: u32,
    pub b: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapLayout {
    pub autosize: bool,
    pub mapbox: Mapbox,
    pub margin: Margin,
}

/// Track of a tag on a map
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapDefinition {
    pub data: Vec<MapTrace>,
    pub layout: MapLayout,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransmissionSummary {
    pub total_rows: usize,
    /// Undefined for an empty range
    pub success_percentage: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableDefinition {
    pub rows: Vec<[String; 2]>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryView {
    pub summary: TransmissionSummary,
    pub table: TableDefinition,
}

/// One display region: the last good view plus the error of the latest attempt, if any
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Widget<T> {
    pub view: Option<T>,
    pub error: Option<String>,
}

impl<T> Default for Widget<T> {
    fn default() -> Self {
        Self {
            view: None,
            error: None,
        }
    }
}

impl<T> Widget<T> {
    pub fn ready(view: T) -> Self {
        Self {
            view: Some(view),
            error: None,
        }
    }

    pub fn failed(error: impl ToString) -> Self {
        Self {
            view: None,
            error: Some(error.to_string()),
        }
    }

    /// Replace the view on success; on failure keep the previous view and record the error
    pub fn apply(&mut self, update: Widget<T>) {
        if update.view.is_some() {
            *self = update;
        } else {
            self.error = update.error;
        }
    }
}

/// The three outputs of one pipeline run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardViews {
    pub time_series: Widget<ChartDefinition>,
    pub map: Widget<MapDefinition>,
    pub summary: Widget<SummaryView>,
}

impl DashboardViews {
    pub fn failed(error: impl ToString) -> Self {
        let message = error.to_string();
        Self {
            time_series: Widget::failed(&message),
            map: Widget::failed(&message),
            summary: Widget::failed(&message),
        }
    }

    pub fn apply(&mut self, update: DashboardViews) {
        self.time_series.apply(update.time_series);
        self.map.apply(update.map);
        self.summary.apply(update.summary);
    }
}
