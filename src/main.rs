// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use anyhow::Context;
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::application::dashboard_service::DashboardService;
use crate::application::map_builder::MapSettings;
use crate::domain::tag::TagId;
use crate::infrastructure::config::{load_access_token, load_config};
use crate::infrastructure::remote_csv_repository::RemoteCsvRepository;
use crate::presentation::app_state::{AppState, InputDefaults};
use crate::presentation::handlers::router;
use crate::presentation::sessions::SessionStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = load_config()?;

    // Initialize tracing, RUST_LOG wins over the debug flag
    let default_level = if config.server.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    // Missing map credential is fatal
    let access_token = load_access_token(&config.map.token_file)?;

    let default_tag: TagId = config
        .dashboard
        .default_tag
        .parse()
        .context("invalid dashboard.default_tag")?;

    // Create repository (infrastructure layer)
    let repository = Arc::new(RemoteCsvRepository::new(
        config.source.base_url.clone(),
        config.source.data_dir.clone(),
        Duration::from_secs(config.source.fetch_timeout_secs),
    )?);

    // Create services (application layer)
    let dashboard_service = DashboardService::new(
        repository,
        MapSettings {
            zoom: config.map.zoom,
            bearing: config.map.bearing,
            access_token,
        },
    );

    // Create application state
    let state = Arc::new(AppState {
        dashboard_service,
        sessions: SessionStore::new(Duration::from_secs(config.dashboard.session_ttl_secs)),
        defaults: InputDefaults {
            tag: default_tag,
            start: config.dashboard.default_start.clone(),
        },
    });

    // Sweep sessions whose page went away without closing them
    let sweeper = state.clone();
    tokio::spawn(async move {
        let period = sweeper.sessions.ttl().max(Duration::from_secs(1));
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            let evicted = sweeper.sessions.evict_idle();
            tracing::debug!(
                "Session sweep: {} evicted, {} live",
                evicted,
                sweeper.sessions.live_count()
            );
        }
    });

    // Build router (presentation layer)
    let router = router(state);
    let router = if config.server.debug {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    };

    // Start server
    let addr: SocketAddr = config
        .server
        .bind
        .parse()
        .with_context(|| format!("invalid server.bind '{}'", config.server.bind))?;
    tracing::info!(
        "Starting tag telemetry dashboard on http://{} (source {})",
        addr,
        config.source.base_url
    );

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
