//! In-memory session store.
//!
//! Single source of truth for session status and accumulated totals. Records
//! live in a `DashMap`; exclusive read-modify-write access goes through the
//! map's per-entry locking. A second map indexes the currently active session
//! per scope key so the one-active-session invariant is enforced at start
//! time without scanning.
//!
//! Lock discipline: nothing in this store (or its callers) acquires a session
//! entry while holding an entry of another map. The session manager may take
//! a user record while holding a session entry, never the reverse.

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::mapref::one::RefMut;
use dashmap::DashMap;
use uuid::Uuid;

use crate::config::SessionScope;
use crate::models::{SessionStatus, WatchSession};

/// Key of the active-session index, derived from the configured scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum ActiveKey {
    User(Uuid),
    UserContent(Uuid, Uuid),
}

/// Outcome of a start request against the active-session invariant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartDisposition {
    Created(Uuid),
    /// An active session already exists for the scope key; its id is returned
    /// instead of creating a duplicate.
    Resumed(Uuid),
}

pub struct SessionStore {
    scope: SessionScope,
    sessions: DashMap<Uuid, WatchSession>,
    active: DashMap<ActiveKey, Uuid>,
}

impl SessionStore {
    pub fn new(scope: SessionScope) -> Self {
        Self {
            scope,
            sessions: DashMap::new(),
            active: DashMap::new(),
        }
    }

    fn key(&self, user_id: Uuid, content_id: Uuid) -> ActiveKey {
        match self.scope {
            SessionScope::PerUser => ActiveKey::User(user_id),
            SessionScope::PerUserContent => ActiveKey::UserContent(user_id, content_id),
        }
    }

    /// Snapshot of a session record.
    pub fn get(&self, session_id: Uuid) -> Option<WatchSession> {
        self.sessions.get(&session_id).map(|s| s.value().clone())
    }

    /// Exclusive access to a session record for a read-modify-write.
    pub(crate) fn lock(&self, session_id: Uuid) -> Option<RefMut<'_, Uuid, WatchSession>> {
        self.sessions.get_mut(&session_id)
    }

    /// Create a session, or return the live one already holding the scope key.
    ///
    /// An index entry pointing at a terminal session (possible if a finalizer
    /// was interrupted between the status flip and the index removal) is
    /// treated as vacant and replaced.
    pub(crate) fn create_or_resume(
        &self,
        user_id: Uuid,
        content_id: Uuid,
        now: DateTime<Utc>,
    ) -> StartDisposition {
        let key = self.key(user_id, content_id);
        loop {
            // Copy ids out of the guards before taking any further lock:
            // scrutinee temporaries would otherwise pin the shard for the
            // whole block.
            let existing = self.active.get(&key).map(|e| *e.value());
            if let Some(existing) = existing {
                let status = self.sessions.get(&existing).map(|s| s.status);
                if status == Some(SessionStatus::Active) {
                    return StartDisposition::Resumed(existing);
                }
                self.active.remove_if(&key, |_, v| *v == existing);
            }

            let session = WatchSession::new(user_id, content_id, now);
            let id = session.id;
            self.sessions.insert(id, session);

            let claimed = match self.active.entry(key.clone()) {
                Entry::Vacant(vacant) => {
                    vacant.insert(id);
                    true
                }
                Entry::Occupied(_) => false,
            };
            if claimed {
                return StartDisposition::Created(id);
            }
            // Lost the race to a concurrent start; discard the unpublished
            // record and resume the winner.
            self.sessions.remove(&id);
        }
    }

    /// Drop the active-index entry for a finalized session. Guarded so a
    /// newer session that reclaimed the key is left untouched.
    pub(crate) fn clear_active(&self, user_id: Uuid, content_id: Uuid, session_id: Uuid) {
        let key = self.key(user_id, content_id);
        self.active.remove_if(&key, |_, v| *v == session_id);
    }

    /// Ids of active sessions whose heartbeat predates `cutoff`. Candidates
    /// only: the finalizer re-validates under the entry lock.
    pub fn stale_candidates(&self, cutoff: DateTime<Utc>) -> Vec<Uuid> {
        self.sessions
            .iter()
            .filter(|s| s.status == SessionStatus::Active && s.last_heartbeat < cutoff)
            .map(|s| s.id)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
