//! Shared strategy context.

use std::sync::Arc;

use offline_cache::{CacheStore, CachedResponse, RequestKey};
use offline_core::Response;
use offline_fetch::Network;
use tracing::warn;

use crate::background::{BackgroundWriter, RevalidationHook, Spawner};

/// Everything a strategy reads or writes through.
#[derive(Clone)]
pub struct StrategyContext {
    network: Arc<dyn Network>,
    store: CacheStore,
    fallbacks: Vec<RequestKey>,
    background: BackgroundWriter,
}

impl StrategyContext {
    /// Create a context with no navigation fallbacks.
    pub fn new(network: Arc<dyn Network>, store: CacheStore) -> Self {
        Self {
            background: BackgroundWriter::new(store.clone()),
            network,
            store,
            fallbacks: Vec::new(),
        }
    }

    /// Set the navigation fallback chain, tried in order.
    pub fn with_fallbacks(mut self, fallbacks: Vec<RequestKey>) -> Self {
        self.fallbacks = fallbacks;
        self
    }

    /// Set the spawner for detached writes.
    pub fn with_spawner(mut self, spawner: Arc<dyn Spawner>) -> Self {
        self.background = self.background.with_spawner(spawner);
        self
    }

    /// Set the hook observing detached writes.
    pub fn with_hook(mut self, hook: Arc<dyn RevalidationHook>) -> Self {
        self.background = self.background.with_hook(hook);
        self
    }

    /// Network.
    pub fn network(&self) -> &Arc<dyn Network> {
        &self.network
    }

    /// Current store.
    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    /// Navigation fallbacks.
    pub fn fallbacks(&self) -> &[RequestKey] {
        &self.fallbacks
    }

    /// Detached writer.
    pub fn background(&self) -> &BackgroundWriter {
        &self.background
    }

    /// Look up a request; a read error counts as a miss.
    pub async fn lookup(&self, key: &RequestKey) -> Option<CachedResponse> {
        match self.store.lookup(key).await {
            Ok(entry) => entry,
            Err(err) => {
                warn!(cache = self.store.name(), key = %key, error = %err, "cache read failed");
                None
            }
        }
    }

    /// Store a response and wait for the write. Refusals are logged, not returned.
    pub async fn write(&self, key: RequestKey, response: Response) {
        if let Err(err) = self.store.store(key.clone(), response).await {
            warn!(cache = self.store.name(), key = %key, error = %err, "cache write refused");
        }
    }
}

impl std::fmt::Debug for StrategyContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StrategyContext")
            .field("store", &self.store)
            .field("fallbacks", &self.fallbacks)
            .finish()
    }
}
