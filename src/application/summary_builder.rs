// Transmission status table
use crate::domain::telemetry::TelemetryRow;
use crate::domain::view::{SummaryView, TableDefinition, TransmissionSummary};

pub fn summarize(rows: &[TelemetryRow]) -> TransmissionSummary {
    let total_rows = rows.len();
    let transmitted = rows.iter().filter(|r| r.transmitted()).count();
    let success_percentage =
        (total_rows > 0).then(|| 100.0 * transmitted as f64 / total_rows as f64);

    TransmissionSummary {
        total_rows,
        success_percentage,
    }
}

pub fn build_summary(rows: &[TelemetryRow]) -> SummaryView {
    let summary = summarize(rows);
    let percentage = summary
        .success_percentage
        .map(|p| format!("{:.1}%", p))
        .unwrap_or_else(|| "N/A".to_string());

    let table = TableDefinition {
        rows: vec![
            [
                "Number of transmissions".to_string(),
                summary.total_rows.to_string(),
            ],
            ["Percentage successful".to_string(), percentage],
        ],
    };

    SummaryView { summary, table }
}
