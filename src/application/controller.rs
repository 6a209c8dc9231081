// Reactive controller - owns the input state and pushes fresh views to the display
use crate::application::dashboard_service::DashboardService;
use crate::domain::error::DashboardError;
use crate::domain::tag::TagId;
use crate::domain::time_range::TimeRange;
use crate::domain::view::DashboardViews;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ControllerState {
    Idle,
    Fetching,
    Rendered,
    Error,
}

/// What the user has selected. Time bounds stay as typed until a pipeline run parses them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InputState {
    pub tag: TagId,
    pub start: String,
    pub end: String,
}

/// A change to one input. Every event refreshes all three outputs.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    TagChanged(TagId),
    StartChanged(String),
    EndChanged(String),
}

impl InputEvent {
    pub fn name(&self) -> &'static str {
        match self {
            InputEvent::TagChanged(_) => "tag",
            InputEvent::StartChanged(_) => "start",
            InputEvent::EndChanged(_) => "end",
        }
    }

    fn apply(self, inputs: &mut InputState) {
        match self {
            InputEvent::TagChanged(tag) => inputs.tag = tag,
            InputEvent::StartChanged(start) => inputs.start = start,
            InputEvent::EndChanged(end) => inputs.end = end,
        }
    }
}

/// Everything the display layer needs to draw the page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplaySnapshot {
    /// Bumped on every input change
    pub generation: u64,
    /// Generation whose views are currently shown
    pub rendered_generation: Option<u64>,
    pub rendered_tag: Option<TagId>,
    pub state: ControllerState,
    pub inputs: InputState,
    pub error: Option<String>,
    pub views: DashboardViews,
}

impl DisplaySnapshot {
    pub fn new(inputs: InputState) -> Self {
        Self {
            generation: 0,
            rendered_generation: None,
            rendered_tag: None,
            state: ControllerState::Idle,
            inputs,
            error: None,
            views: DashboardViews::default(),
        }
    }
}

/// Receives every snapshot the controller publishes
pub trait DisplaySink: Send + Sync {
    fn render(&self, snapshot: &DisplaySnapshot);
}

/// Keeps only the newest snapshot for subscribers
pub struct WatchDisplay {
    tx: watch::Sender<DisplaySnapshot>,
}

impl WatchDisplay {
    pub fn new(initial: DisplaySnapshot) -> Self {
        let (tx, _) = watch::channel(initial);
        Self { tx }
    }

    pub fn subscribe(&self) -> watch::Receiver<DisplaySnapshot> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    pub fn current(&self) -> DisplaySnapshot {
        self.tx.borrow().clone()
    }
}

impl DisplaySink for WatchDisplay {
    fn render(&self, snapshot: &DisplaySnapshot) {
        self.tx.send_replace(snapshot.clone());
    }
}

pub struct DashboardController {
    service: DashboardService,
    sink: Arc<dyn DisplaySink>,
    snapshot: Mutex<DisplaySnapshot>,
}

impl DashboardController {
    pub fn new(service: DashboardService, sink: Arc<dyn DisplaySink>, inputs: InputState) -> Self {
        Self {
            service,
            sink,
            snapshot: Mutex::new(DisplaySnapshot::new(inputs)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, DisplaySnapshot> {
        self.snapshot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> DisplaySnapshot {
        self.lock().clone()
    }

    /// Apply an input change and start a pipeline run for the new input state.
    ///
    /// Runs are not cancelled. A run that finishes after a newer input change
    /// is discarded, so the display only ever shows the latest inputs.
    pub fn handle(self: &Arc<Self>, event: InputEvent) -> JoinHandle<()> {
        let (generation, inputs) = {
            let mut snapshot = self.lock();
            tracing::debug!("Input '{}' changed: {:?}", event.name(), event);
            event.apply(&mut snapshot.inputs);
            snapshot.generation += 1;
            snapshot.state = ControllerState::Fetching;
            self.sink.render(&snapshot);
            (snapshot.generation, snapshot.inputs.clone())
        };

        let controller = Arc::clone(self);
        tokio::spawn(async move {
            let outcome = controller.run(&inputs).await;
            controller.complete(generation, inputs.tag, outcome);
        })
    }

    async fn run(&self, inputs: &InputState) -> Result<DashboardViews, DashboardError> {
        let range = TimeRange::parse(&inputs.start, &inputs.end)?;
        self.service.render(inputs.tag, range).await
    }

    fn complete(
        &self,
        generation: u64,
        tag: TagId,
        outcome: Result<DashboardViews, DashboardError>,
    ) {
        let mut snapshot = self.lock();
        if generation != snapshot.generation {
            tracing::debug!(
                "Dropping stale result for tag {} (generation {}, latest {})",
                tag,
                generation,
                snapshot.generation
            );
            return;
        }

        match outcome {
            Ok(views) => {
                snapshot.views.apply(views);
                snapshot.state = ControllerState::Rendered;
                snapshot.error = None;
                snapshot.rendered_generation = Some(generation);
                snapshot.rendered_tag = Some(tag);
            }
            Err(e) => {
                tracing::warn!("Dashboard update for tag {} failed: {}", tag, e);
                snapshot.views.apply(DashboardViews::failed(&e));
                snapshot.state = ControllerState::Error;
                snapshot.error = Some(e.to_string());
            }
        }
        self.sink.render(&snapshot);
    }
}
