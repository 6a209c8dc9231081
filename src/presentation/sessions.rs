// Live dashboard sessions, one controller per open page
use crate::application::controller::{
    DashboardController, DisplaySnapshot, InputState, WatchDisplay,
};
use crate::application::dashboard_service::DashboardService;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};

#[derive(Clone)]
pub struct Session {
    pub controller: Arc<DashboardController>,
    pub display: Arc<WatchDisplay>,
}

struct Entry {
    session: Session,
    last_seen: Instant,
}

impl Entry {
    /// A session with an open stream never expires
    fn is_idle(&self, now: Instant, ttl: Duration) -> bool {
        self.session.display.subscriber_count() == 0
            && now.duration_since(self.last_seen) >= ttl
    }
}

pub struct SessionStore {
    next_id: AtomicU64,
    ttl: Duration,
    sessions: RwLock<HashMap<u64, Entry>>,
}

impl SessionStore {
    /// Sessions untouched for `ttl` and without a stream subscriber are dropped
    pub fn new(ttl: Duration) -> Self {
        Self {
            next_id: AtomicU64::new(0),
            ttl,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn create(&self, service: DashboardService, inputs: InputState) -> (u64, Session) {
        self.evict_idle();

        let display = Arc::new(WatchDisplay::new(DisplaySnapshot::new(inputs.clone())));
        let controller = Arc::new(DashboardController::new(service, display.clone(), inputs));
        let session = Session {
            controller,
            display,
        };

        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                id,
                Entry {
                    session: session.clone(),
                    last_seen: Instant::now(),
                },
            );
        tracing::debug!("Opened session {}", id);
        (id, session)
    }

    /// Look up a session and mark it as seen
    pub fn get(&self, id: u64) -> Option<Session> {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        let entry = sessions.get_mut(&id)?;
        entry.last_seen = Instant::now();
        Some(entry.session.clone())
    }

    pub fn remove(&self, id: u64) -> bool {
        let removed = self
            .sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id)
            .is_some();
        if removed {
            tracing::debug!("Closed session {}", id);
        }
        removed
    }

    /// Drop idle sessions, returning how many went
    pub fn evict_idle(&self) -> usize {
        let now = Instant::now();
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        let before = sessions.len();
        sessions.retain(|_, entry| !entry.is_idle(now, self.ttl));
        let evicted = before - sessions.len();
        if evicted > 0 {
            tracing::debug!("Evicted {} idle sessions, {} left", evicted, sessions.len());
        }
        evicted
    }

    pub fn live_count(&self) -> usize {
        self.sessions.read().unwrap_or_else(PoisonError::into_inner).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::dashboard_service::tests::{StaticRepository, map_settings};
    use crate::domain::telemetry::test_rows;

    fn service() -> DashboardService {
        DashboardService::new(Arc::new(StaticRepository(test_rows(3))), map_settings())
    }

    fn inputs() -> InputState {
        InputState {
            tag: "38".parse().unwrap(),
            start: "2018-01-01 00:00:00".to_string(),
            end: "2019-01-01 00:00:00".to_string(),
        }
    }

    #[test]
    fn test_abandoned_sessions_are_evicted() {
        let store = SessionStore::new(Duration::from_millis(500));
        for _ in 0..1000 {
            store.create(service(), inputs());
        }
        assert_eq!(store.live_count(), 1000);

        std::thread::sleep(Duration::from_millis(600));
        assert_eq!(store.evict_idle(), 1000);
        assert_eq!(store.live_count(), 0);
    }

    #[test]
    fn test_create_sweeps_idle_sessions() {
        let store = SessionStore::new(Duration::from_millis(20));
        let (abandoned, _) = store.create(service(), inputs());

        std::thread::sleep(Duration::from_millis(30));
        let (fresh, _) = store.create(service(), inputs());

        assert!(store.get(abandoned).is_none());
        assert!(store.get(fresh).is_some());
        assert_eq!(store.live_count(), 1);
    }

    #[test]
    fn test_streaming_or_recently_seen_sessions_survive() {
        let store = SessionStore::new(Duration::from_millis(200));
        let (streaming, session) = store.create(service(), inputs());
        let _rx = session.display.subscribe();
        let (polled, _) = store.create(service(), inputs());

        std::thread::sleep(Duration::from_millis(120));
        assert!(store.get(polled).is_some());
        std::thread::sleep(Duration::from_millis(120));

        assert_eq!(store.evict_idle(), 0);
        assert!(store.get(streaming).is_some());
        assert!(store.get(polled).is_some());
    }
}
