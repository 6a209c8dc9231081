// Remote CSV repository - downloads gapped files over HTTP
use crate::application::telemetry_repository::TelemetryRepository;
use crate::domain::error::DashboardError;
use crate::domain::tag::TagId;
use crate::domain::telemetry::TelemetryDataset;
use crate::infrastructure::telemetry_csv::parse_telemetry_csv;
use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Fetches `{base_url}/{tag}_gapped.csv` and keeps the last download of each
/// tag in `data_dir`, overwritten on every fetch.
///
/// The local copy is not locked: two sessions fetching the same tag at once
/// race on the file. Parsing always uses the downloaded body, never the file.
#[derive(Debug, Clone)]
pub struct RemoteCsvRepository {
    client: reqwest::Client,
    base_url: String,
    data_dir: PathBuf,
}

impl RemoteCsvRepository {
    pub fn new(
        base_url: String,
        data_dir: PathBuf,
        timeout: Duration,
    ) -> Result<Self, DashboardError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DashboardError::Config(format!("cannot build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            data_dir,
        })
    }

    fn csv_url(&self, tag: TagId) -> String {
        format!("{}/{}", self.base_url, tag.csv_file_name())
    }

    pub fn local_path(&self, tag: TagId) -> PathBuf {
        self.data_dir.join(tag.csv_file_name())
    }

    async fn download(&self, tag: TagId) -> Result<Bytes, DashboardError> {
        let url = self.csv_url(tag);
        tracing::info!("Fetching {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| DashboardError::network(tag, e))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(DashboardError::network(
                tag,
                format!("{} returned {}", url, status),
            ));
        }

        response
            .bytes()
            .await
            .map_err(|e| DashboardError::network(tag, e))
    }

    async fn store(&self, path: &Path, body: &[u8]) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.data_dir).await?;
        tokio::fs::write(path, body).await
    }
}

#[async_trait]
impl TelemetryRepository for RemoteCsvRepository {
    async fn fetch(&self, tag: TagId) -> Result<TelemetryDataset, DashboardError> {
        let body = self.download(tag).await?;

        let path = self.local_path(tag);
        self.store(&path, &body)
            .await
            .map_err(|e| {
                DashboardError::network(tag, format!("cannot write {}: {}", path.display(), e))
            })?;

        let dataset = parse_telemetry_csv(body.as_ref())?;
        if dataset.is_empty() {
            tracing::warn!("Tag {} has no telemetry rows", tag);
        } else {
            tracing::debug!("Loaded {} rows for tag {}", dataset.len(), tag);
        }
        Ok(dataset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, extract::Path as UrlPath, http::StatusCode, routing::get};
    use std::net::SocketAddr;

    const GOOD_CSV: &str = "date,vsolar,vbatt,degC,Δd,clat,clng\n\
2018-03-01 00:00:00,4.1,3.6,21.0,0.0,-19.3,146.7\n\
2018-03-01 01:00:00,,,,,,\n";

    async fn serve_csv(UrlPath(file): UrlPath<String>) -> Result<&'static str, StatusCode> {
        match file.as_str() {
            "3600038_gapped.csv" => Ok(GOOD_CSV),
            "3600049_gapped.csv" => Ok("date,vsolar\n2018-03-01 00:00:00,4.1\n"),
            _ => Err(StatusCode::NOT_FOUND),
        }
    }

    async fn spawn_server() -> SocketAddr {
        let router = Router::new().route("/ct/:file", get(serve_csv));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        addr
    }

    fn repository(addr: SocketAddr, data_dir: &std::path::Path) -> RemoteCsvRepository {
        repository_with_timeout(addr, data_dir, Duration::from_secs(5))
    }

    fn repository_with_timeout(
        addr: SocketAddr,
        data_dir: &std::path::Path,
        timeout: Duration,
    ) -> RemoteCsvRepository {
        RemoteCsvRepository::new(format!("http://{}/ct/", addr), data_dir.to_path_buf(), timeout)
            .unwrap()
    }

    #[tokio::test]
    async fn test_fetch_parses_and_overwrites_local_copy() {
        let addr = spawn_server().await;
        let dir = tempfile::tempdir().unwrap();
        let repo = repository(addr, &dir.path().join("data"));
        let tag: TagId = "38".parse().unwrap();

        std::fs::create_dir_all(dir.path().join("data")).unwrap();
        std::fs::write(repo.local_path(tag), "stale").unwrap();

        let dataset = repo.fetch(tag).await.unwrap();
        assert_eq!(dataset.len(), 2);
        assert!(!dataset.rows()[1].transmitted());

        let local = std::fs::read_to_string(repo.local_path(tag)).unwrap();
        assert_eq!(local, GOOD_CSV);
    }

    #[tokio::test]
    async fn test_missing_remote_file_is_network_error() {
        let addr = spawn_server().await;
        let dir = tempfile::tempdir().unwrap();
        let repo = repository(addr, dir.path());

        let err = repo.fetch("80".parse().unwrap()).await.unwrap_err();
        match err {
            DashboardError::NetworkFetch { tag, message } => {
                assert_eq!(tag, "3600080");
                assert!(message.contains("404"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_missing_columns_is_data_shape_error() {
        let addr = spawn_server().await;
        let dir = tempfile::tempdir().unwrap();
        let repo = repository(addr, dir.path());

        let err = repo.fetch("49".parse().unwrap()).await.unwrap_err();
        assert!(matches!(err, DashboardError::DataShape(_)));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_network_error() {
        // Bind then drop to get a port nothing listens on
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let dir = tempfile::tempdir().unwrap();
        let repo = repository(addr, dir.path());
        let err = repo.fetch("38".parse().unwrap()).await.unwrap_err();
        assert!(matches!(err, DashboardError::NetworkFetch { .. }));
    }

    #[tokio::test]
    async fn test_hung_server_times_out_as_network_error() {
        // Accepts connections and never writes a byte back
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            loop {
                let (socket, _) = listener.accept().await.unwrap();
                held.push(socket);
            }
        });

        let dir = tempfile::tempdir().unwrap();
        let repo = repository_with_timeout(addr, dir.path(), Duration::from_millis(300));
        let started = std::time::Instant::now();
        let err = repo.fetch("38".parse().unwrap()).await.unwrap_err();

        assert!(matches!(err, DashboardError::NetworkFetch { .. }), "{err}");
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
