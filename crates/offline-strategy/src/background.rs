//! Detached cache writes.
//!
//! The cache-first strategy hands its response back before the refresh
//! fetch and the store write settle. That work runs as a detached task:
//! failures are logged and swallowed, and completion is reported to an
//! optional `RevalidationHook` so tests and metrics can observe it.

use std::sync::Arc;

use futures::future::BoxFuture;
use offline_cache::{CacheError, CacheStore, RequestKey};
use offline_core::{InterceptedRequest, Response};
use offline_fetch::{FetchError, Network};
use tracing::{debug, warn};

/// Executor for detached work.
pub trait Spawner: Send + Sync {
    /// Run a task to completion independently of the caller.
    fn spawn(&self, task: BoxFuture<'static, ()>);
}

/// Spawns onto the ambient Tokio runtime.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSpawner;

impl Spawner for TokioSpawner {
    fn spawn(&self, task: BoxFuture<'static, ()>) {
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(task);
            }
            Err(_) => warn!("no tokio runtime available, background cache write dropped"),
        }
    }
}

/// How a detached cache write settled.
#[derive(Debug, Clone)]
pub enum RevalidationOutcome {
    /// The store now holds the fresh response.
    Updated,
    /// The refresh fetch failed; the store is unchanged.
    FetchFailed(FetchError),
    /// The fetch succeeded but the store refused the write.
    StoreFailed(CacheError),
}

impl RevalidationOutcome {
    /// Check if the store was updated.
    pub fn is_updated(&self) -> bool {
        matches!(self, Self::Updated)
    }
}

/// Observer for detached cache writes.
pub trait RevalidationHook: Send + Sync {
    /// Called once per detached write, after it settled.
    fn on_settled(&self, key: &RequestKey, outcome: &RevalidationOutcome);
}

/// Submits detached refreshes and writes against the current store.
#[derive(Clone)]
pub struct BackgroundWriter {
    store: CacheStore,
    spawner: Arc<dyn Spawner>,
    hook: Option<Arc<dyn RevalidationHook>>,
}

impl BackgroundWriter {
    /// Create a writer using the Tokio spawner and no hook.
    pub fn new(store: CacheStore) -> Self {
        Self {
            store,
            spawner: Arc::new(TokioSpawner),
            hook: None,
        }
    }

    /// Set the spawner.
    pub fn with_spawner(mut self, spawner: Arc<dyn Spawner>) -> Self {
        self.spawner = spawner;
        self
    }

    /// Set the completion hook.
    pub fn with_hook(mut self, hook: Arc<dyn RevalidationHook>) -> Self {
        self.hook = Some(hook);
        self
    }

    /// Fetch `request` and store the result, detached from the caller.
    pub fn refresh(&self, network: Arc<dyn Network>, request: InterceptedRequest) {
        let store = self.store.clone();
        let hook = self.hook.clone();

        self.spawner.spawn(Box::pin(async move {
            let key = RequestKey::for_request(&request);
            let outcome = match network.fetch(&request).await {
                Ok(response) => write_outcome(&store, key.clone(), response).await,
                Err(err) => RevalidationOutcome::FetchFailed(err),
            };
            settle(hook.as_deref(), &key, outcome);
        }));
    }

    /// Store an already fetched response, detached from the caller.
    pub fn write(&self, key: RequestKey, response: Response) {
        let store = self.store.clone();
        let hook = self.hook.clone();

        self.spawner.spawn(Box::pin(async move {
            let outcome = write_outcome(&store, key.clone(), response).await;
            settle(hook.as_deref(), &key, outcome);
        }));
    }
}

impl std::fmt::Debug for BackgroundWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackgroundWriter")
            .field("store", &self.store)
            .field("hook", &self.hook.is_some())
            .finish()
    }
}

async fn write_outcome(store: &CacheStore, key: RequestKey, response: Response) -> RevalidationOutcome {
    match store.store(key, response).await {
        Ok(()) => RevalidationOutcome::Updated,
        Err(err) => RevalidationOutcome::StoreFailed(err),
    }
}

fn settle(hook: Option<&dyn RevalidationHook>, key: &RequestKey, outcome: RevalidationOutcome) {
    match &outcome {
        RevalidationOutcome::Updated => debug!(key = %key, "background cache write settled"),
        RevalidationOutcome::FetchFailed(err) => {
            debug!(key = %key, error = %err, "background refresh fetch failed")
        }
        RevalidationOutcome::StoreFailed(err) => {
            warn!(key = %key, error = %err, "background cache write refused")
        }
    }

    if let Some(hook) = hook {
        hook.on_settled(key, &outcome);
    }
}
