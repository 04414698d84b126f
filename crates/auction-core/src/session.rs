//! Session store: opaque session id → authenticated user id.
//!
//! Sessions are created at successful login and consulted by every
//! request that requires identity. They are never persisted; a process
//! restart drops all of them.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::models::UserId;

pub type SessionId = u32;

/// First id handed out. Everything below is reserved, `0` means anonymous.
pub const FIRST_SESSION_ID: SessionId = 1000;

#[derive(Debug, Clone, Copy)]
struct SessionEntry {
    user_id: UserId,
    last_seen: Instant,
}

/// Thread-safe session map shared by all connection workers.
///
/// With `ttl = None` a session lives until it is invalidated or the
/// process exits. With a TTL, a session idle for longer than the TTL is
/// dropped on its next lookup.
#[derive(Debug)]
pub struct SessionStore {
    next_id: AtomicU32,
    sessions: DashMap<SessionId, SessionEntry>,
    ttl: Option<Duration>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(None)
    }
}

impl SessionStore {
    pub fn new(ttl: Option<Duration>) -> Self {
        SessionStore {
            next_id: AtomicU32::new(FIRST_SESSION_ID),
            sessions: DashMap::new(),
            ttl,
        }
    }

    /// Allocate a fresh, never-reused session id bound to `user_id`.
    pub fn create(&self, user_id: UserId) -> SessionId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.sessions.insert(
            id,
            SessionEntry {
                user_id,
                last_seen: Instant::now(),
            },
        );
        id
    }

    /// Resolve a session id. `0` and unknown ids resolve to `None`.
    pub fn lookup(&self, session_id: SessionId) -> Option<UserId> {
        if session_id == 0 {
            return None;
        }

        let expired = {
            let mut entry = self.sessions.get_mut(&session_id)?;
            match self.ttl {
                Some(ttl) if entry.last_seen.elapsed() > ttl => true,
                _ => {
                    entry.last_seen = Instant::now();
                    return Some(entry.user_id);
                }
            }
        };

        if expired {
            self.sessions.remove(&session_id);
        }
        None
    }

    /// Drop a session. Unknown ids are ignored.
    pub fn invalidate(&self, session_id: SessionId) {
        self.sessions.remove(&session_id);
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[test]
    fn lookup_returns_bound_user() {
        let store = SessionStore::default();
        let id = store.create(7);
        assert!(id >= FIRST_SESSION_ID);
        assert_eq!(store.lookup(id), Some(7));
    }

    #[test]
    fn never_issued_and_anonymous_ids_are_absent() {
        let store = SessionStore::default();
        store.create(1);
        assert_eq!(store.lookup(0), None);
        assert_eq!(store.lookup(42), None);
        assert_eq!(store.lookup(FIRST_SESSION_ID + 99), None);
    }

    #[test]
    fn invalidate_removes_and_is_idempotent() {
        let store = SessionStore::default();
        let id = store.create(3);
        store.invalidate(id);
        assert_eq!(store.lookup(id), None);
        store.invalidate(id);
        store.invalidate(12345);
        assert!(store.is_empty());
    }

    #[test]
    fn ids_increase_monotonically() {
        let store = SessionStore::default();
        let a = store.create(1);
        let b = store.create(1);
        assert!(b > a);
        assert_eq!(store.lookup(a), Some(1));
        assert_eq!(store.lookup(b), Some(1));
    }

    #[test]
    fn expired_session_is_dropped_on_lookup() {
        let store = SessionStore::new(Some(Duration::from_millis(10)));
        let id = store.create(5);
        std::thread::sleep(Duration::from_millis(30));
        assert_eq!(store.lookup(id), None);
        assert!(store.is_empty());
    }

    #[test]
    fn concurrent_creation_yields_unique_ids() {
        let store = Arc::new(SessionStore::default());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let store = store.clone();
                std::thread::spawn(move || (0..100).map(|_| store.create(t)).collect::<Vec<_>>())
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for id in handle.join().unwrap() {
                assert!(seen.insert(id), "duplicate session id {id}");
            }
        }
        assert_eq!(store.len(), 800);
    }
}
