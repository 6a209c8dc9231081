// Domain errors
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("failed to fetch telemetry for tag {tag}: {message}")]
    NetworkFetch { tag: String, message: String },

    #[error("unexpected telemetry data shape: {0}")]
    DataShape(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid timestamp '{0}', expected YYYY-MM-DD HH:MM:SS")]
    InvalidTimestamp(String),

    #[error("unknown tag '{0}'")]
    UnknownTag(String),
}

impl DashboardError {
    pub fn network(tag: impl ToString, err: impl std::fmt::Display) -> Self {
        Self::NetworkFetch {
            tag: tag.to_string(),
            message: err.to_string(),
        }
    }
}
