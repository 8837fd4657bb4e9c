//! Registry of live sessions, used only to coordinate shutdown

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::task::JoinHandle;

#[derive(Debug)]
struct SessionEntry {
    peer: SocketAddr,
    handle: JoinHandle<()>,
}

#[derive(Debug, Default)]
struct RegistryState {
    sessions: HashMap<u64, SessionEntry>,
    closed: bool,
}

/// Live sessions keyed by id.
///
/// The lock is held only for insert, remove, lookups and the shutdown drain,
/// never across an `.await`. Once [`SessionRegistry::close`] has run, no
/// session can be registered again.
#[derive(Debug, Clone, Default)]
pub struct SessionRegistry {
    inner: Arc<Mutex<RegistryState>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Start a session task and register it.
    ///
    /// `spawn` runs with the lock held, so a task that finishes immediately
    /// cannot deregister itself before it has been registered. Returns false
    /// without calling `spawn` once the registry is closed.
    pub fn register<F>(&self, id: u64, peer: SocketAddr, spawn: F) -> bool
    where
        F: FnOnce() -> JoinHandle<()>,
    {
        let mut state = self.lock();
        if state.closed {
            return false;
        }
        let handle = spawn();
        state.sessions.insert(id, SessionEntry { peer, handle });
        true
    }

    /// Returns false if the session was already gone
    pub fn remove(&self, id: u64) -> bool {
        self.lock().sessions.remove(&id).is_some()
    }

    pub fn contains(&self, id: u64) -> bool {
        self.lock().sessions.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.lock().sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().sessions.is_empty()
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// (id, peer) for every live session, ordered by id
    pub fn sessions(&self) -> Vec<(u64, SocketAddr)> {
        let mut sessions: Vec<(u64, SocketAddr)> = self
            .lock()
            .sessions
            .iter()
            .map(|(id, entry)| (*id, entry.peer))
            .collect();
        sessions.sort_by_key(|(id, _)| *id);
        sessions
    }

    /// Refuse further registrations and take every task handle
    pub fn close(&self) -> Vec<(u64, JoinHandle<()>)> {
        let mut state = self.lock();
        state.closed = true;
        state
            .sessions
            .drain()
            .map(|(id, entry)| (id, entry.handle))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peer(port: u16) -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], port))
    }

    #[tokio::test]
    async fn test_register_and_remove() {
        let registry = SessionRegistry::new();
        registry.register(1, peer(5001), || tokio::spawn(async {}));
        registry.register(2, peer(5002), || tokio::spawn(async {}));

        assert_eq!(registry.len(), 2);
        assert!(registry.contains(1));
        assert_eq!(registry.sessions(), vec![(1, peer(5001)), (2, peer(5002))]);

        assert!(registry.remove(1));
        assert!(!registry.remove(1));
        assert!(!registry.contains(1));
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_task_deregisters_itself() {
        let registry = SessionRegistry::new();
        let inner = registry.clone();
        registry.register(7, peer(5007), move || {
            tokio::spawn(async move {
                inner.remove(7);
            })
        });

        for _ in 0..100 {
            if registry.is_empty() {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_close_empties_registry() {
        let registry = SessionRegistry::new();
        registry.register(1, peer(5001), || tokio::spawn(async {}));
        registry.register(2, peer(5002), || tokio::spawn(async {}));

        let handles = registry.close();
        assert_eq!(handles.len(), 2);
        assert!(registry.is_empty());
        assert!(registry.is_closed());
        for (_, handle) in handles {
            handle.await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_register_after_close_is_refused() {
        let registry = SessionRegistry::new();
        registry.close();

        let mut spawned = false;
        let registered = registry.register(3, peer(5003), || {
            spawned = true;
            tokio::spawn(async {})
        });

        assert!(!registered);
        assert!(!spawned);
        assert!(registry.is_empty());
    }
}
