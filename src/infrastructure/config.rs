use crate::domain::error::DashboardError;
use anyhow::Context;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerSettings,
    pub source: SourceSettings,
    #[serde(default)]
    pub map: MapConfig,
    #[serde(default)]
    pub dashboard: DashboardDefaults,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Verbose logging and per-request tracing
    #[serde(default)]
    pub debug: bool,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            debug: false,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SourceSettings {
    /// e.g. https://host/ct, the tag file name is appended
    pub base_url: String,
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MapConfig {
    #[serde(default = "default_token_file")]
    pub token_file: PathBuf,
    #[serde(default = "default_zoom")]
    pub zoom: f64,
    #[serde(default)]
    pub bearing: f64,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            token_file: default_token_file(),
            zoom: default_zoom(),
            bearing: 0.0,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct DashboardDefaults {
    #[serde(default = "default_tag")]
    pub default_tag: String,
    #[serde(default = "default_start")]
    pub default_start: String,
    /// Sessions without a stream and untouched this long are dropped
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: u64,
}

impl Default for DashboardDefaults {
    fn default() -> Self {
        Self {
            default_tag: default_tag(),
            default_start: default_start(),
            session_ttl_secs: default_session_ttl_secs(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:8050".to_string()
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_fetch_timeout_secs() -> u64 {
    30
}

fn default_token_file() -> PathBuf {
    PathBuf::from("token_key.txt")
}

fn default_zoom() -> f64 {
    10.0
}

fn default_tag() -> String {
    "3600038".to_string()
}

fn default_start() -> String {
    "2018-01-01 00:00:00".to_string()
}

fn default_session_ttl_secs() -> u64 {
    1800
}

/// Load `config/dashboard.*`, overridden by `TAG_DASHBOARD__SECTION__KEY` variables
pub fn load_config() -> anyhow::Result<AppConfig> {
    build_config(config::File::with_name("config/dashboard"))
}

fn build_config<S>(file: S) -> anyhow::Result<AppConfig>
where
    S: config::Source + Send + Sync + 'static,
{
    let settings = config::Config::builder()
        .add_source(file)
        .add_source(config::Environment::with_prefix("TAG_DASHBOARD").separator("__"))
        .build()
        .context("failed to read dashboard configuration")?;

    Ok(settings.try_deserialize()?)
}

/// Read the map tile credential: the first line of the token file
pub fn load_access_token(path: &Path) -> Result<String, DashboardError> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        DashboardError::Config(format!("cannot read access token {}: {}", path.display(), e))
    })?;

    contents
        .lines()
        .next()
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .ok_or_else(|| {
            DashboardError::Config(format!("access token file {} is empty", path.display()))
        })
}
