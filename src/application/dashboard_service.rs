// Dashboard service - fetch, filter, then build the three views
use crate::application::map_builder::{MapSettings, build_map};
use crate::application::summary_builder::build_summary;
use crate::application::telemetry_repository::TelemetryRepository;
use crate::application::time_series_builder::build_time_series;
use crate::domain::error::DashboardError;
use crate::domain::tag::TagId;
use crate::domain::telemetry::TelemetryRow;
use crate::domain::time_range::TimeRange;
use crate::domain::view::{DashboardViews, Widget};
use std::sync::Arc;
use tokio::task::JoinError;

#[derive(Clone)]
pub struct DashboardService {
    repository: Arc<dyn TelemetryRepository>,
    map_settings: Arc<MapSettings>,
}

impl DashboardService {
    pub fn new(repository: Arc<dyn TelemetryRepository>, map_settings: MapSettings) -> Self {
        Self {
            repository,
            map_settings: Arc::new(map_settings),
        }
    }

    /// Run the whole pipeline for one input state.
    ///
    /// A fetch or parse failure fails the run as a whole. Once the filtered rows
    /// exist, each view is built on its own task so one failing builder only
    /// marks its own widget.
    pub async fn render(
        &self,
        tag: TagId,
        range: TimeRange,
    ) -> Result<DashboardViews, DashboardError> {
        let dataset = self.repository.fetch(tag).await?;
        let rows: Arc<[TelemetryRow]> = range.filter(dataset.rows()).into();

        tracing::debug!(
            "Tag {}: {} of {} rows inside {} .. {}",
            tag,
            rows.len(),
            dataset.len(),
            range.start,
            range.end
        );

        let time_series = tokio::task::spawn_blocking({
            let rows = rows.clone();
            move || build_time_series(&rows)
        });
        let map = tokio::task::spawn_blocking({
            let rows = rows.clone();
            let settings = self.map_settings.clone();
            move || build_map(&rows, &settings)
        });
        let summary = tokio::task::spawn_blocking(move || build_summary(&rows));

        let (time_series, map, summary) = tokio::join!(time_series, map, summary);

        Ok(DashboardViews {
            time_series: widget("time_series", time_series),
            map: widget("map", map),
            summary: widget("summary", summary),
        })
    }
}

fn widget<T>(output: &str, result: Result<T, JoinError>) -> Widget<T> {
    match result {
        Ok(view) => Widget::ready(view),
        Err(e) => {
            tracing::error!("Building {} failed: {}", output, e);
            Widget::failed(format!("failed to build {}", output))
        }
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::domain::telemetry::{TelemetryDataset, test_rows};
    use async_trait::async_trait;

    /// Serves the same rows for every tag
    pub struct StaticRepository(pub Vec<TelemetryRow>);

    #[async_trait]
    impl TelemetryRepository for StaticRepository {
        async fn fetch(&self, _tag: TagId) -> Result<TelemetryDataset, DashboardError> {
            Ok(TelemetryDataset::new(self.0.clone()))
        }
    }

    struct OfflineRepository;

    #[async_trait]
    impl TelemetryRepository for OfflineRepository {
        async fn fetch(&self, tag: TagId) -> Result<TelemetryDataset, DashboardError> {
            Err(DashboardError::network(tag, "connection refused"))
        }
    }

    pub fn map_settings() -> MapSettings {
        MapSettings {
            zoom: 10.0,
            bearing: 0.0,
            access_token: "pk.test".to_string(),
        }
    }

    fn tag() -> TagId {
        "38".parse().unwrap()
    }

    #[tokio::test]
    async fn test_full_range_builds_all_views() {
        let mut rows = test_rows(10);
        for row in rows.iter_mut().skip(7) {
            row.solar_voltage = None;
        }
        let service = DashboardService::new(Arc::new(StaticRepository(rows)), map_settings());
        let range = TimeRange::parse("2018-02-28 00:00:00", "2018-03-02 00:00:00").unwrap();

        let views = service.render(tag(), range).await.unwrap();
        let summary = views.summary.view.unwrap().summary;
        assert_eq!(summary.total_rows, 10);
        assert_eq!(summary.success_percentage, Some(70.0));
        assert_eq!(views.time_series.view.unwrap().data[0].x.len(), 10);
        assert_eq!(views.map.view.unwrap().data[0].lat.len(), 10);
    }

    #[tokio::test]
    async fn test_range_before_all_rows_renders_empty_views() {
        let service =
            DashboardService::new(Arc::new(StaticRepository(test_rows(10))), map_settings());
        let range = TimeRange::parse("2017-01-01 00:00:00", "2017-06-01 00:00:00").unwrap();

        let views = service.render(tag(), range).await.unwrap();
        let summary = views.summary.view.unwrap();
        assert_eq!(summary.summary.total_rows, 0);
        assert_eq!(summary.table.rows[1][1], "N/A");

        let map = views.map.view.unwrap();
        assert!(map.data[0].lat.is_empty());
        assert!(map.layout.mapbox.center.is_none());

        let chart = views.time_series.view.unwrap();
        assert!(chart.data.iter().all(|t| t.y.is_empty()));
    }

    #[tokio::test]
    async fn test_fetch_failure_is_returned() {
        let service = DashboardService::new(Arc::new(OfflineRepository), map_settings());
        let range = TimeRange::parse("2018-01-01", "2019-01-01").unwrap();

        let err = service.render(tag(), range).await.unwrap_err();
        assert!(matches!(err, DashboardError::NetworkFetch { .. }));
    }
}
