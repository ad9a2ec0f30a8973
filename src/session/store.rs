use chrono::Local;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info};

use super::history::{History, HistoryLimits};
use super::prompt::SYSTEM_PROMPT;
use crate::models::Turn;
use crate::utils::WaiterError;

/// Shared handle to one session's history
///
/// Holding the lock is what makes a writer the single writer for that session.
type SessionHandle = Arc<Mutex<History>>;

/// Process-wide mapping from session id to history
///
/// The outer map lock is only held long enough to look up or insert a handle,
/// so a slow turn on one session never blocks another session.
pub struct HistoryStore {
    sessions: RwLock<HashMap<String, SessionHandle>>,
    preamble: String,
    limits: HistoryLimits,
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::new(SYSTEM_PROMPT, HistoryLimits::default())
    }
}

impl HistoryStore {
    pub fn new(preamble: impl Into<String>, limits: HistoryLimits) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            preamble: preamble.into(),
            limits,
        }
    }

    /// Handle for `session_id`, creating a preamble-seeded history if absent
    fn handle(&self, session_id: &str) -> SessionHandle {
        if let Some(handle) = self.sessions.read().get(session_id) {
            return Arc::clone(handle);
        }

        let mut sessions = self.sessions.write();
        // Another writer may have inserted between the two locks
        Arc::clone(sessions.entry(session_id.to_string()).or_insert_with(|| {
            debug!(session_id, "Created session history");
            Arc::new(Mutex::new(History::new(&self.preamble)))
        }))
    }

    /// Handle for `session_id` only if the session already exists
    fn existing(&self, session_id: &str) -> Option<SessionHandle> {
        self.sessions.read().get(session_id).cloned()
    }

    async fn guard(&self, session_id: &str, handle: SessionHandle) -> SessionGuard<'_> {
        SessionGuard {
            store: self,
            session_id: session_id.to_string(),
            history: handle.lock_owned().await,
        }
    }

    /// Exclusive access to `session_id`, creating it if absent
    ///
    /// Other writers on the same session wait until the guard is dropped.
    pub async fn lock(&self, session_id: &str) -> SessionGuard<'_> {
        let handle = self.handle(session_id);
        let mut session = self.guard(session_id, handle).await;
        session.history.touch();
        session
    }

    /// Exclusive access to `session_id` only if it already exists
    pub async fn lock_existing(&self, session_id: &str) -> Result<SessionGuard<'_>, WaiterError> {
        let handle = self.existing(session_id).ok_or_else(|| {
            WaiterError::InvalidState(format!(
                "append to unknown session '{session_id}'; call get_or_create first"
            ))
        })?;
        Ok(self.guard(session_id, handle).await)
    }

    /// Turn sequence of `session_id`, creating it if absent
    ///
    /// Calling this repeatedly without an append in between returns the same sequence.
    pub async fn get_or_create(&self, session_id: &str) -> Vec<Turn> {
        self.lock(session_id).await.turns().to_vec()
    }

    /// Append `turn` to an existing session, returning the new length
    pub async fn append(&self, session_id: &str, turn: Turn) -> Result<usize, WaiterError> {
        let mut session = self.lock_existing(session_id).await?;
        Ok(session.append(turn))
    }

    /// Current turn sequence without creating the session
    pub async fn snapshot(&self, session_id: &str) -> Option<Vec<Turn>> {
        let handle = self.existing(session_id)?;
        let history = handle.lock().await;
        Some(history.turns().to_vec())
    }

    /// Forget a session. Returns whether it existed.
    ///
    /// A turn already in flight on the session finishes against the detached
    /// history; the next message starts from a fresh preamble.
    pub fn clear(&self, session_id: &str) -> bool {
        let removed = self.sessions.write().remove(session_id).is_some();
        if removed {
            info!(session_id, "Cleared session history");
        }
        removed
    }

    /// Number of live sessions
    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }

    /// Drop sessions not touched for longer than `ttl`. Returns how many were dropped.
    ///
    /// Sessions whose handle is held outside the store (a turn in progress, or
    /// about to start) are always kept.
    pub fn evict_idle(&self, ttl: Duration) -> usize {
        let Ok(ttl) = chrono::Duration::from_std(ttl) else {
            return 0;
        };
        let cutoff = Local::now() - ttl;

        let mut sessions = self.sessions.write();
        let before = sessions.len();
        sessions.retain(|_, handle| {
            if Arc::strong_count(handle) > 1 {
                return true;
            }
            match handle.try_lock() {
                Ok(history) => history.updated_at() >= cutoff,
                Err(_) => true,
            }
        });

        let evicted = before - sessions.len();
        if evicted > 0 {
            info!(evicted, remaining = sessions.len(), "Evicted idle sessions");
        }
        evicted
    }
}

/// Locked view of one session's history
///
/// Appends go through the store's limits. Holding the guard keeps the session
/// safe from idle eviction.
pub struct SessionGuard<'a> {
    store: &'a HistoryStore,
    session_id: String,
    history: OwnedMutexGuard<History>,
}

impl SessionGuard<'_> {
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn turns(&self) -> &[Turn] {
        self.history.turns()
    }

    /// Append `turn`, compacting if needed. Returns the new length.
    pub fn append(&mut self, turn: Turn) -> usize {
        let evicted = self.history.push(turn, self.store.limits);
        if evicted > 0 {
            debug!(
                session_id = %self.session_id,
                evicted,
                "Compacted session history"
            );
        }
        self.history.len()
    }
}
