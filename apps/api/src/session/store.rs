use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::session::model::{Session, SessionKey, SessionSummary};

#[derive(Debug, Clone, Copy)]
pub struct SessionLimits {
    pub idle_ttl: Duration,
    pub max_sessions: usize,
}

impl Default for SessionLimits {
    fn default() -> Self {
        SessionLimits {
            idle_ttl: Duration::from_secs(86_400),
            max_sessions: 10_000,
        }
    }
}

/// In-memory session arena. Every operation takes the lock once and releases
/// it before returning, so callers never hold it across an `.await`.
///
/// Nothing is persisted: a restart drops every session.
pub struct SessionStore {
    sessions: RwLock<HashMap<SessionKey, Session>>,
    limits: SessionLimits,
}

impl SessionStore {
    pub fn new(limits: SessionLimits) -> Self {
        SessionStore {
            sessions: RwLock::new(HashMap::new()),
            limits,
        }
    }

    /// Snapshot of the session, creating an idle one if absent.
    pub fn get_or_create(&self, key: &SessionKey) -> Session {
        self.update(key, |session| session.clone())
    }

    pub fn get(&self, key: &SessionKey) -> Option<Session> {
        self.sessions.read().get(key).cloned()
    }

    pub fn contains(&self, key: &SessionKey) -> bool {
        self.sessions.read().contains_key(key)
    }

    /// Applies `mutator` atomically, creating the session first if needed.
    pub fn update<R>(&self, key: &SessionKey, mutator: impl FnOnce(&mut Session) -> R) -> R {
        let mut sessions = self.sessions.write();
        if !sessions.contains_key(key) {
            evict_for_insert(&mut sessions, self.limits.max_sessions);
        }
        let session = sessions
            .entry(key.clone())
            .or_insert_with(|| Session::new(key.clone()));
        session.touch();
        mutator(session)
    }

    /// Like `update`, but never creates: `None` when the key is unknown.
    pub fn try_update<R>(
        &self,
        key: &SessionKey,
        mutator: impl FnOnce(&mut Session) -> R,
    ) -> Option<R> {
        let mut sessions = self.sessions.write();
        let session = sessions.get_mut(key)?;
        session.touch();
        Some(mutator(session))
    }

    /// Returns false when there was no such session.
    pub fn clear_history(&self, key: &SessionKey) -> bool {
        self.try_update(key, |session| session.history.clear())
            .is_some()
    }

    pub fn delete(&self, key: &SessionKey) -> bool {
        self.sessions.write().remove(key).is_some()
    }

    pub fn list(&self) -> Vec<SessionSummary> {
        let mut summaries: Vec<_> = self.sessions.read().values().map(Session::summary).collect();
        summaries.sort_by(|a, b| b.last_active_at.cmp(&a.last_active_at));
        summaries
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    /// Drops sessions idle for longer than the configured TTL. Returns how many.
    pub fn sweep_idle(&self, now: DateTime<Utc>) -> usize {
        let ttl = chrono::Duration::from_std(self.limits.idle_ttl)
            .unwrap_or_else(|_| chrono::Duration::MAX);
        let mut sessions = self.sessions.write();
        let before = sessions.len();
        sessions.retain(|_, s| now.signed_duration_since(s.last_active_at) <= ttl);
        before - sessions.len()
    }
}

/// Makes room for one more session by dropping the least recently active ones.
fn evict_for_insert(sessions: &mut HashMap<SessionKey, Session>, max_sessions: usize) {
    while !sessions.is_empty() && sessions.len() >= max_sessions {
        let oldest = sessions
            .values()
            .min_by_key(|s| s.last_active_at)
            .map(|s| s.key.clone());
        match oldest {
            Some(key) => {
                debug!("Session capacity reached, evicting {key}");
                sessions.remove(&key);
            }
            None => break,
        }
    }
}

/// Runs `sweep_idle` every `interval` until `shutdown` is cancelled.
pub fn spawn_sweeper(
    store: Arc<SessionStore>,
    interval: Duration,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    debug!("Session sweeper stopped");
                    break;
                }
                _ = ticker.tick() => {
                    let removed = store.sweep_idle(Utc::now());
                    if removed > 0 {
                        info!("Swept {removed} idle sessions ({} remain)", store.len());
                    }
                }
            }
        }
    })
}
