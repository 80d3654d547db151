//! Named store backends.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use offline_core::Response;

use crate::error::{CacheError, CacheResult};
use crate::key::RequestKey;

/// A response snapshot kept in a store.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedResponse {
    /// The stored response.
    pub response: Response,
    /// When the entry was written.
    pub stored_at: DateTime<Utc>,
}

impl CachedResponse {
    /// Snapshot a response now.
    pub fn new(response: Response) -> Self {
        Self {
            response,
            stored_at: Utc::now(),
        }
    }

    /// Age in seconds.
    pub fn age_secs(&self) -> u64 {
        let age = Utc::now().signed_duration_since(self.stored_at);
        age.num_seconds().max(0) as u64
    }
}

/// Backend holding any number of named stores.
///
/// Writes are last-writer-wins per key. Store names are returned in
/// creation order.
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Create a store if it does not exist.
    async fn open(&self, name: &str) -> CacheResult<()>;

    /// Names of all existing stores.
    async fn keys(&self) -> CacheResult<Vec<String>>;

    /// Check whether a store exists.
    async fn has(&self, name: &str) -> CacheResult<bool>;

    /// Delete a store and all its entries. Returns whether it existed.
    async fn delete(&self, name: &str) -> CacheResult<bool>;

    /// Look up an entry in one store.
    async fn match_entry(&self, name: &str, key: &RequestKey)
        -> CacheResult<Option<CachedResponse>>;

    /// Write an entry, creating the store if needed.
    async fn put(&self, name: &str, key: RequestKey, response: Response) -> CacheResult<()>;

    /// Write several entries atomically: either all are stored or none.
    async fn put_all(&self, name: &str, entries: Vec<(RequestKey, Response)>) -> CacheResult<()>;

    /// Keys of all entries in one store.
    async fn entry_keys(&self, name: &str) -> CacheResult<Vec<RequestKey>>;
}

/// Reject entries a store must never hold.
pub fn check_cacheable(key: &RequestKey, response: &Response) -> CacheResult<()> {
    if !key.is_cacheable() {
        return Err(CacheError::MethodNotCacheable(key.method().clone()));
    }
    if response.is_partial() {
        return Err(CacheError::PartialResponse(key.url().to_string()));
    }
    Ok(())
}

#[derive(Debug, Default)]
struct Stores {
    order: Vec<String>,
    entries: HashMap<String, HashMap<RequestKey, CachedResponse>>,
}

impl Stores {
    fn open(&mut self, name: &str) -> &mut HashMap<RequestKey, CachedResponse> {
        if !self.entries.contains_key(name) {
            self.order.push(name.to_string());
        }
        self.entries.entry(name.to_string()).or_default()
    }
}

/// In-memory cache storage.
#[derive(Debug, Default)]
pub struct MemoryCacheStorage {
    stores: RwLock<Stores>,
}

impl MemoryCacheStorage {
    /// Create an empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> CacheResult<RwLockReadGuard<'_, Stores>> {
        self.stores
            .read()
            .map_err(|_| CacheError::Storage("cache storage lock poisoned".to_string()))
    }

    fn write(&self) -> CacheResult<RwLockWriteGuard<'_, Stores>> {
        self.stores
            .write()
            .map_err(|_| CacheError::Storage("cache storage lock poisoned".to_string()))
    }
}

#[async_trait]
impl CacheStorage for MemoryCacheStorage {
    async fn open(&self, name: &str) -> CacheResult<()> {
        self.write()?.open(name);
        Ok(())
    }

    async fn keys(&self) -> CacheResult<Vec<String>> {
        Ok(self.read()?.order.clone())
    }

    async fn has(&self, name: &str) -> CacheResult<bool> {
        Ok(self.read()?.entries.contains_key(name))
    }

    async fn delete(&self, name: &str) -> CacheResult<bool> {
        let mut stores = self.write()?;
        stores.order.retain(|n| n != name);
        Ok(stores.entries.remove(name).is_some())
    }

    async fn match_entry(
        &self,
        name: &str,
        key: &RequestKey,
    ) -> CacheResult<Option<CachedResponse>> {
        Ok(self
            .read()?
            .entries
            .get(name)
            .and_then(|store| store.get(key))
            .cloned())
    }

    async fn put(&self, name: &str, key: RequestKey, response: Response) -> CacheResult<()> {
        check_cacheable(&key, &response)?;
        self.write()?
            .open(name)
            .insert(key, CachedResponse::new(response));
        Ok(())
    }

    async fn put_all(&self, name: &str, entries: Vec<(RequestKey, Response)>) -> CacheResult<()> {
        for (key, response) in &entries {
            check_cacheable(key, response)?;
        }

        let mut stores = self.write()?;
        let store = stores.open(name);
        for (key, response) in entries {
            store.insert(key, CachedResponse::new(response));
        }
        Ok(())
    }

    async fn entry_keys(&self, name: &str) -> CacheResult<Vec<RequestKey>> {
        Ok(self
            .read()?
            .entries
            .get(name)
            .map(|store| store.keys().cloned().collect())
            .unwrap_or_default())
    }
}
