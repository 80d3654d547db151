//! Accessor for the current-version store.

use std::sync::Arc;

use offline_core::{CacheVersion, Response};

use crate::error::CacheResult;
use crate::key::RequestKey;
use crate::storage::{CacheStorage, CachedResponse};

/// Thin wrapper over the store named after the current cache version.
///
/// Holds only a name reference; the entries are owned by the backend.
#[derive(Clone)]
pub struct CacheStore {
    storage: Arc<dyn CacheStorage>,
    version: CacheVersion,
}

impl CacheStore {
    /// Create an accessor for `version` over a backend.
    pub fn new(storage: Arc<dyn CacheStorage>, version: CacheVersion) -> Self {
        Self { storage, version }
    }

    /// Store name.
    pub fn name(&self) -> &str {
        self.version.as_str()
    }

    /// Cache version this accessor is bound to.
    pub fn version(&self) -> &CacheVersion {
        &self.version
    }

    /// Underlying backend.
    pub fn storage(&self) -> &Arc<dyn CacheStorage> {
        &self.storage
    }

    /// Create the store if it does not exist.
    pub async fn open(&self) -> CacheResult<()> {
        self.storage.open(self.name()).await
    }

    /// Look up a request.
    pub async fn lookup(&self, key: &RequestKey) -> CacheResult<Option<CachedResponse>> {
        self.storage.match_entry(self.name(), key).await
    }

    /// Write a response for a request.
    pub async fn store(&self, key: RequestKey, response: Response) -> CacheResult<()> {
        self.storage.put(self.name(), key, response).await
    }

    /// Write several responses atomically.
    pub async fn store_all(&self, entries: Vec<(RequestKey, Response)>) -> CacheResult<()> {
        self.storage.put_all(self.name(), entries).await
    }

    /// Keys of every entry in the store.
    pub async fn keys(&self) -> CacheResult<Vec<RequestKey>> {
        self.storage.entry_keys(self.name()).await
    }

    /// Number of entries in the store.
    pub async fn len(&self) -> CacheResult<usize> {
        Ok(self.keys().await?.len())
    }
}

impl std::fmt::Debug for CacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheStore")
            .field("name", &self.version.as_str())
            .finish()
    }
}
