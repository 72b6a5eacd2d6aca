// Application state for HTTP handlers
use crate::application::chat_service::ChatService;
use crate::application::dashboard_service::DashboardService;
use crate::domain::session::ChatSession;
use crate::infrastructure::config::SessionSettings;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};

#[derive(Clone)]
pub struct AppState {
    pub chat_service: ChatService,
    pub dashboard_service: DashboardService,
    pub sessions: SessionStore,
}

struct SessionSlot {
    session: Arc<Mutex<ChatSession>>,
    last_seen: Instant,
    // Monotonic touch counter, breaks ties between equal instants
    touched: u64,
}

#[derive(Default)]
struct Sessions {
    slots: HashMap<String, SessionSlot>,
    touches: u64,
}

/// Chat sessions keyed by id. Each session has its own lock so one slow
/// backend call only blocks further turns of the same conversation.
///
/// Sessions idle longer than the TTL are pruned on insert, and the least
/// recently used ones are evicted beyond `max_sessions`. Sessions with a
/// request in flight are never pruned.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<RwLock<Sessions>>,
    max_sessions: usize,
    idle_ttl: Duration,
    max_history: usize,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(&SessionSettings::default())
    }
}

impl SessionStore {
    pub fn new(settings: &SessionSettings) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Sessions::default())),
            max_sessions: settings.max_sessions.max(1),
            idle_ttl: Duration::from_secs(settings.idle_ttl_secs),
            max_history: settings.max_history,
        }
    }

    pub async fn get(&self, id: &str) -> Option<Arc<Mutex<ChatSession>>> {
        self.inner.read().await.slots.get(id).map(|slot| slot.session.clone())
    }

    pub async fn get_or_create(&self, id: &str) -> Arc<Mutex<ChatSession>> {
        let mut sessions = self.inner.write().await;
        let now = Instant::now();
        self.prune_idle(&mut sessions, now);

        sessions.touches += 1;
        let touched = sessions.touches;
        let max_history = self.max_history;
        let slot = sessions.slots.entry(id.to_string()).or_insert_with(|| {
            tracing::info!("Starting chat session {}", id);
            SessionSlot {
                session: Arc::new(Mutex::new(ChatSession::with_history_limit(
                    id.to_string(),
                    max_history,
                ))),
                last_seen: now,
                touched,
            }
        });
        slot.last_seen = now;
        slot.touched = touched;
        let session = slot.session.clone();

        self.evict_over_capacity(&mut sessions, id);
        session
    }

    fn prune_idle(&self, sessions: &mut Sessions, now: Instant) {
        let before = sessions.slots.len();
        let ttl = self.idle_ttl;
        sessions
            .slots
            .retain(|_, slot| in_use(slot) || now.duration_since(slot.last_seen) <= ttl);
        let pruned = before - sessions.slots.len();
        if pruned > 0 {
            tracing::debug!("Pruned {} idle chat sessions", pruned);
        }
    }

    fn evict_over_capacity(&self, sessions: &mut Sessions, keep: &str) {
        while sessions.slots.len() > self.max_sessions {
            let oldest = sessions
                .slots
                .iter()
                .filter(|(id, slot)| id.as_str() != keep && !in_use(slot))
                .min_by_key(|(_, slot)| slot.touched)
                .map(|(id, _)| id.clone());
            match oldest {
                Some(id) => {
                    tracing::debug!("Evicting chat session {}", id);
                    sessions.slots.remove(&id);
                }
                None => break,
            }
        }
    }
}

/// Someone besides the store holds the session
fn in_use(slot: &SessionSlot) -> bool {
    Arc::strong_count(&slot.session) > 1
}
