// Application state for HTTP handlers
use crate::application::controller::InputState;
use crate::application::dashboard_service::DashboardService;
use crate::domain::tag::TagId;
use crate::domain::time_range::TIMESTAMP_FORMAT;
use crate::presentation::sessions::SessionStore;

#[derive(Debug, Clone)]
pub struct InputDefaults {
    pub tag: TagId,
    pub start: String,
}

pub struct AppState {
    pub dashboard_service: DashboardService,
    pub sessions: SessionStore,
    pub defaults: InputDefaults,
}

impl AppState {
    /// Inputs for a fresh page: configured tag and start, end at the current local time
    pub fn initial_inputs(&self) -> InputState {
        InputState {
            tag: self.defaults.tag,
            start: self.defaults.start.clone(),
            end: now(),
        }
    }
}

pub fn now() -> String {
    chrono::Local::now()
        .naive_local()
        .format(TIMESTAMP_FORMAT)
        .to_string()
}
