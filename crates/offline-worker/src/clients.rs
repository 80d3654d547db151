//! Client sessions controlled by the worker.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use offline_core::CacheVersion;

/// Identifier of an open client session (tab, window).
pub type ClientId = u64;

/// Host view of open client sessions.
#[async_trait]
pub trait Clients: Send + Sync {
    /// Make every open session controlled by `version`.
    ///
    /// Returns the number of sessions whose controller changed.
    async fn claim(&self, version: &CacheVersion) -> usize;
}

/// In-process registry of sessions and the version controlling each.
#[derive(Debug, Default)]
pub struct ClientRegistry {
    next_id: AtomicU64,
    sessions: Mutex<BTreeMap<ClientId, Option<CacheVersion>>>,
}

impl ClientRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open an uncontrolled session.
    pub fn open(&self) -> ClientId {
        self.insert(None)
    }

    /// Open a session already controlled by `version`.
    pub fn open_controlled(&self, version: CacheVersion) -> ClientId {
        self.insert(Some(version))
    }

    fn insert(&self, controller: Option<CacheVersion>) -> ClientId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        if let Ok(mut sessions) = self.sessions.lock() {
            sessions.insert(id, controller);
        }
        id
    }

    /// Close a session. Returns false if it was not open.
    pub fn close(&self, id: ClientId) -> bool {
        self.sessions
            .lock()
            .map(|mut sessions| sessions.remove(&id).is_some())
            .unwrap_or(false)
    }

    /// Version controlling a session, if any.
    pub fn controller(&self, id: ClientId) -> Option<CacheVersion> {
        self.sessions
            .lock()
            .ok()
            .and_then(|sessions| sessions.get(&id).cloned().flatten())
    }

    /// Number of open sessions.
    pub fn len(&self) -> usize {
        self.sessions.lock().map(|s| s.len()).unwrap_or(0)
    }

    /// Check if no session is open.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl Clients for ClientRegistry {
    async fn claim(&self, version: &CacheVersion) -> usize {
        let Ok(mut sessions) = self.sessions.lock() else {
            return 0;
        };

        let mut changed = 0;
        for controller in sessions.values_mut() {
            if controller.as_ref() != Some(version) {
                *controller = Some(version.clone());
                changed += 1;
            }
        }
        changed
    }
}
