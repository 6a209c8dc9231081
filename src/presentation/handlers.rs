// HTTP request handlers
use crate::application::controller::{InputEvent, InputState};
use crate::domain::error::DashboardError;
use crate::domain::tag::{TagId, TagOption};
use crate::domain::time_range::TimeRange;
use crate::domain::view::DashboardViews;
use crate::infrastructure::http_response::{accepts_brotli, json_response};
use crate::infrastructure::ndjson_stream::{ndjson_response, watch_stream};
use crate::presentation::app_state::{AppState, now};
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{delete, get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const DASHBOARD_HTML: &str = include_str!("dashboard.html");

/// Input fields, from the query string or a JSON body; absent fields are left alone
#[derive(Debug, Deserialize)]
pub struct DashboardInputs {
    pub tag: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

#[derive(Serialize)]
struct SessionCreated {
    id: u64,
    inputs: InputState,
}

#[derive(Serialize)]
struct InputsAccepted {
    generation: u64,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(dashboard_page))
        .route("/healthz", get(health_check))
        .route("/api/tags", get(list_tags))
        .route("/api/dashboard", get(render_dashboard))
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/:id", delete(close_session))
        .route("/api/sessions/:id/inputs", post(update_inputs))
        .route("/api/sessions/:id/views", get(session_views))
        .route("/api/sessions/:id/stream", get(stream_session))
        .with_state(state)
}

fn status_for(error: &DashboardError) -> StatusCode {
    match error {
        DashboardError::UnknownTag(_) | DashboardError::InvalidTimestamp(_) => {
            StatusCode::BAD_REQUEST
        }
        DashboardError::NetworkFetch { .. } | DashboardError::DataShape(_) => {
            StatusCode::BAD_GATEWAY
        }
        DashboardError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

async fn respond<T: Serialize>(status: StatusCode, data: &T, compress: bool) -> Response {
    match json_response(status, data, compress).await {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}

async fn error_response(error: &DashboardError, compress: bool) -> Response {
    let body = ErrorBody {
        error: error.to_string(),
    };
    respond(status_for(error), &body, compress).await
}

fn not_found(id: u64) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorBody {
            error: format!("no session {}", id),
        }),
    )
        .into_response()
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

pub async fn dashboard_page() -> Html<&'static str> {
    Html(DASHBOARD_HTML)
}

pub async fn list_tags() -> Json<Vec<TagOption>> {
    Json(TagId::all().iter().copied().map(TagOption::from).collect())
}

/// Stateless pipeline run for one input state
pub async fn render_dashboard(
    Query(query): Query<DashboardInputs>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    let compress = accepts_brotli(&headers);

    let tag = match query.tag.as_deref().map(str::parse::<TagId>) {
        Some(Ok(tag)) => tag,
        Some(Err(e)) => return error_response(&e, compress).await,
        None => state.defaults.tag,
    };
    let start = query.start.unwrap_or_else(|| state.defaults.start.clone());
    let end = query.end.unwrap_or_else(now);
    let range = match TimeRange::parse(&start, &end) {
        Ok(range) => range,
        Err(e) => return error_response(&e, compress).await,
    };

    match state.dashboard_service.render(tag, range).await {
        Ok(views) => respond(StatusCode::OK, &views, compress).await,
        Err(e) => {
            tracing::warn!("Dashboard for tag {} failed: {}", tag, e);
            respond(status_for(&e), &DashboardViews::failed(&e), compress).await
        }
    }
}

/// Open a live session and start its first load
pub async fn create_session(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    let inputs = state.initial_inputs();
    let (id, session) = state
        .sessions
        .create(state.dashboard_service.clone(), inputs.clone());
    drop(session.controller.handle(InputEvent::TagChanged(inputs.tag)));

    respond(
        StatusCode::CREATED,
        &SessionCreated { id, inputs },
        accepts_brotli(&headers),
    )
    .await
}

/// Apply each field present in the body as its own input change
pub async fn update_inputs(
    Path(id): Path<u64>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    Json(update): Json<DashboardInputs>,
) -> Response {
    let compress = accepts_brotli(&headers);
    let Some(session) = state.sessions.get(id) else {
        return not_found(id);
    };

    let mut events = Vec::new();
    if let Some(tag) = update.tag.as_deref() {
        match tag.parse::<TagId>() {
            Ok(tag) => events.push(InputEvent::TagChanged(tag)),
            Err(e) => return error_response(&e, compress).await,
        }
    }
    if let Some(start) = update.start {
        events.push(InputEvent::StartChanged(start));
    }
    if let Some(end) = update.end {
        events.push(InputEvent::EndChanged(end));
    }

    for event in events {
        drop(session.controller.handle(event));
    }

    let generation = session.controller.snapshot().generation;
    respond(StatusCode::ACCEPTED, &InputsAccepted { generation }, compress).await
}

pub async fn session_views(
    Path(id): Path<u64>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    match state.sessions.get(id) {
        Some(session) => {
            respond(
                StatusCode::OK,
                &session.display.current(),
                accepts_brotli(&headers),
            )
            .await
        }
        None => not_found(id),
    }
}

/// Push every snapshot of the session as it renders
pub async fn stream_session(Path(id): Path<u64>, State(state): State<Arc<AppState>>) -> Response {
    match state.sessions.get(id) {
        Some(session) => {
            ndjson_response(watch_stream(session.display.subscribe())).into_response()
        }
        None => not_found(id),
    }
}

pub async fn close_session(Path(id): Path<u64>, State(state): State<Arc<AppState>>) -> Response {
    if state.sessions.remove(id) {
        StatusCode::NO_CONTENT.into_response()
    } else {
        not_found(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::controller::ControllerState;
    use crate::application::dashboard_service::DashboardService;
    use crate::application::dashboard_service::tests::{StaticRepository, map_settings};
    use crate::domain::telemetry::test_rows;
    use crate::presentation::app_state::InputDefaults;
    use crate::presentation::sessions::SessionStore;
    use serde_json::{Value, json};
    use std::net::SocketAddr;
    use std::time::Duration;

    async fn spawn_app() -> SocketAddr {
        let mut rows = test_rows(10);
        for row in rows.iter_mut().take(3) {
            row.solar_voltage = None;
        }
        let state = Arc::new(AppState {
            dashboard_service: DashboardService::new(
                Arc::new(StaticRepository(rows)),
                map_settings(),
            ),
            sessions: SessionStore::new(Duration::from_secs(1800)),
            defaults: InputDefaults {
                tag: "38".parse().unwrap(),
                start: "2018-01-01 00:00:00".to_string(),
            },
        });

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router(state)).await.unwrap();
        });
        addr
    }

    fn client() -> reqwest::Client {
        reqwest::Client::builder().no_proxy().build().unwrap()
    }

    async fn get(url: String) -> reqwest::Response {
        client().get(url).send().await.unwrap()
    }

    async fn wait_for_render(
        client: &reqwest::Client,
        addr: SocketAddr,
        id: u64,
        tag: &str,
    ) -> Value {
        for _ in 0..200 {
            let snapshot: Value = client
                .get(format!("http://{}/api/sessions/{}/views", addr, id))
                .send()
                .await
                .unwrap()
                .json()
                .await
                .unwrap();
            if snapshot["state"] == "rendered" && snapshot["rendered_tag"] == tag {
                return snapshot;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("session {} never rendered tag {}", id, tag);
    }

    #[tokio::test]
    async fn test_tags_and_health() {
        let addr = spawn_app().await;
        let health = get(format!("http://{}/healthz", addr)).await;
        assert_eq!(health.text().await.unwrap(), "ok");

        let tags: Value = get(format!("http://{}/api/tags", addr))
            .await
            .json()
            .await
            .unwrap();
        assert_eq!(tags.as_array().unwrap().len(), 9);
        assert_eq!(tags[0], json!({"id": "3600038", "label": "3600038", "value": "38"}));
    }

    #[tokio::test]
    async fn test_one_shot_dashboard() {
        let addr = spawn_app().await;
        let url = format!(
            "http://{}/api/dashboard?tag=3600049&start=2018-01-01%2000:00:00&end=2018-12-31%2000:00:00",
            addr
        );
        let views: Value = get(url).await.json().await.unwrap();

        assert_eq!(views["summary"]["view"]["summary"]["total_rows"], 10);
        assert_eq!(views["summary"]["view"]["summary"]["success_percentage"], 70.0);
        assert_eq!(views["time_series"]["view"]["data"].as_array().unwrap().len(), 4);
        assert_eq!(views["map"]["view"]["data"][0]["type"], "scattermapbox");
    }

    #[tokio::test]
    async fn test_one_shot_rejects_bad_inputs() {
        let addr = spawn_app().await;
        let unknown = get(format!("http://{}/api/dashboard?tag=12", addr)).await;
        assert_eq!(unknown.status(), StatusCode::BAD_REQUEST);

        let bad_start = get(format!("http://{}/api/dashboard?start=whenever", addr)).await;
        assert_eq!(bad_start.status(), StatusCode::BAD_REQUEST);
        let body: Value = bad_start.json().await.unwrap();
        assert!(body["error"].as_str().unwrap().contains("whenever"));
    }

    #[tokio::test]
    async fn test_session_flow() {
        let addr = spawn_app().await;
        let client = client();

        let created: Value = client
            .post(format!("http://{}/api/sessions", addr))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        let id = created["id"].as_u64().unwrap();
        assert_eq!(created["inputs"]["tag"], "3600038");

        let first = wait_for_render(&client, addr, id, "3600038").await;
        assert_eq!(first["views"]["summary"]["view"]["table"]["rows"][1][1], "70.0%");

        let accepted = client
            .post(format!("http://{}/api/sessions/{}/inputs", addr, id))
            .json(&json!({"tag": "49", "end": "2018-03-01 05:30:00"}))
            .send()
            .await
            .unwrap();
        assert_eq!(accepted.status(), StatusCode::ACCEPTED);
        let accepted: Value = accepted.json().await.unwrap();
        assert_eq!(accepted["generation"], 3);

        let second = wait_for_render(&client, addr, id, "3600049").await;
        // Rows at 00:00 .. 05:00, strictly after the start
        assert_eq!(second["views"]["summary"]["view"]["summary"]["total_rows"], 6);
        assert_eq!(second["inputs"]["end"], "2018-03-01 05:30:00");

        let closed = client
            .delete(format!("http://{}/api/sessions/{}", addr, id))
            .send()
            .await
            .unwrap();
        assert_eq!(closed.status(), StatusCode::NO_CONTENT);

        let gone = client
            .get(format!("http://{}/api/sessions/{}/views", addr, id))
            .send()
            .await
            .unwrap();
        assert_eq!(gone.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_stream_starts_with_current_snapshot() {
        let addr = spawn_app().await;
        let client = client();
        let created: Value = client
            .post(format!("http://{}/api/sessions", addr))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        let id = created["id"].as_u64().unwrap();

        let mut response = client
            .get(format!("http://{}/api/sessions/{}/stream", addr, id))
            .send()
            .await
            .unwrap();
        let mut buffer = Vec::new();
        while !buffer.contains(&b'\n') {
            let chunk = response.chunk().await.unwrap().expect("stream ended early");
            buffer.extend_from_slice(&chunk);
        }
        let line_end = buffer.iter().position(|b| *b == b'\n').unwrap();
        let snapshot: Value = serde_json::from_slice(&buffer[..line_end]).unwrap();
        assert_eq!(snapshot["inputs"]["tag"], "3600038");
        assert_ne!(snapshot["state"], serde_json::to_value(ControllerState::Idle).unwrap());
    }
}
