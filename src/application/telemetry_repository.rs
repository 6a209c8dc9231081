// Repository trait for telemetry data access
use crate::domain::error::DashboardError;
use crate::domain::tag::TagId;
use crate::domain::telemetry::TelemetryDataset;
use async_trait::async_trait;

#[async_trait]
pub trait TelemetryRepository: Send + Sync {
    /// Download the tag's gapped CSV and parse it. Every call goes to the remote endpoint.
    async fn fetch(&self, tag: TagId) -> Result<TelemetryDataset, DashboardError>;
}
