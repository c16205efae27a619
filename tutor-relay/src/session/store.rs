//! Session registry.
//!
//! The relay talks to a [`SessionStore`] rather than a global map so the
//! backing store can be swapped (or faked in tests). Each session sits
//! behind its own async mutex: holding the handle's lock is what serializes
//! concurrent requests for the same session identifier.

use super::types::Session;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Shared, individually lockable session.
pub type SessionHandle = Arc<Mutex<Session>>;

/// Keyed session registry.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Look up an existing session.
    async fn get(&self, id: &str) -> Option<SessionHandle>;

    /// Return the session for `id`, creating a primed one if absent.
    ///
    /// The flag is `true` when the session was created by this call.
    async fn get_or_create(&self, id: &str, priming_text: &str) -> (SessionHandle, bool);

    /// Drop a session. Returns whether it existed.
    async fn remove(&self, id: &str) -> bool;

    /// Remove sessions untouched for longer than `max_idle_secs`.
    ///
    /// Sessions in use by an in-flight request are never evicted.
    async fn evict_idle(&self, max_idle_secs: i64) -> usize;

    /// Number of live sessions.
    async fn len(&self) -> usize;

    async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// Process-lifetime, in-memory session store.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, SessionHandle>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, id: &str) -> Option<SessionHandle> {
        self.sessions.read().await.get(id).cloned()
    }

    async fn get_or_create(&self, id: &str, priming_text: &str) -> (SessionHandle, bool) {
        if let Some(handle) = self.get(id).await {
            return (handle, false);
        }

        let mut sessions = self.sessions.write().await;
        // Another request may have created it between the two locks.
        if let Some(handle) = sessions.get(id) {
            return (Arc::clone(handle), false);
        }

        let handle = Arc::new(Mutex::new(Session::primed(id, priming_text)));
        sessions.insert(id.to_string(), Arc::clone(&handle));
        tracing::debug!(session_id = %id, "Session created");
        (handle, true)
    }

    async fn remove(&self, id: &str) -> bool {
        self.sessions.write().await.remove(id).is_some()
    }

    async fn evict_idle(&self, max_idle_secs: i64) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();

        sessions.retain(|_, handle| {
            // Outstanding clones mean a request is working on this session.
            if Arc::strong_count(handle) > 1 {
                return true;
            }
            match handle.try_lock() {
                Ok(session) => !session.is_idle(max_idle_secs),
                Err(_) => true,
            }
        });

        before - sessions.len()
    }

    async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Turn;
    use chrono::{Duration, Utc};

    #[tokio::test]
    async fn test_get_or_create_primes_once() {
        let store = InMemorySessionStore::new();
        assert!(store.is_empty().await);

        let (first, created) = store.get_or_create("abc", "prime").await;
        assert!(created);
        first.lock().await.push(Turn::user("hello there"));

        let (second, created) = store.get_or_create("abc", "other prime").await;
        assert!(!created);
        assert!(Arc::ptr_eq(&first, &second));

        let session = second.lock().await;
        assert_eq!(session.len(), 2);
        assert_eq!(session.turns()[0].text(), "prime");
    }

    #[tokio::test]
    async fn test_get_unknown_is_none() {
        let store = InMemorySessionStore::new();
        assert!(store.get("missing").await.is_none());
        assert!(!store.remove("missing").await);
    }

    #[tokio::test]
    async fn test_remove() {
        let store = InMemorySessionStore::new();
        store.get_or_create("abc", "prime").await;
        assert_eq!(store.len().await, 1);
        assert!(store.remove("abc").await);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_evict_idle_removes_stale_sessions() {
        let store = InMemorySessionStore::new();
        {
            let (stale, _) = store.get_or_create("stale", "prime").await;
            stale.lock().await.last_touched = Utc::now() - Duration::seconds(3600);
        }
        store.get_or_create("fresh", "prime").await;

        let evicted = store.evict_idle(60).await;
        assert_eq!(evicted, 1);
        assert!(store.get("stale").await.is_none());
        assert!(store.get("fresh").await.is_some());
    }

    #[tokio::test]
    async fn test_evict_idle_skips_sessions_in_use() {
        let store = InMemorySessionStore::new();
        let (held, _) = store.get_or_create("busy", "prime").await;
        held.lock().await.last_touched = Utc::now() - Duration::seconds(3600);

        assert_eq!(store.evict_idle(60).await, 0);
        assert!(store.get("busy").await.is_some());

        drop(held);
        assert_eq!(store.evict_idle(60).await, 1);
    }

    #[tokio::test]
    async fn test_concurrent_creation_yields_single_session() {
        let store = Arc::new(InMemorySessionStore::new());
        let mut tasks = tokio::task::JoinSet::new();

        for _ in 0..16 {
            let store = Arc::clone(&store);
            tasks.spawn(async move { store.get_or_create("shared", "prime").await.1 });
        }

        let mut created = 0;
        while let Some(result) = tasks.join_next().await {
            if result.unwrap() {
                created += 1;
            }
        }

        assert_eq!(created, 1);
        assert_eq!(store.len().await, 1);
    }
}
