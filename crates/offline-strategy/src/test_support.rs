//! Shared fixtures for strategy tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use http::Method;
use offline_cache::{CacheStore, MemoryCacheStorage, RequestKey};
use offline_core::{CacheVersion, InterceptedRequest, Response};
use offline_fetch::{FetchError, Network};
use tokio::sync::{mpsc, Notify};
use url::Url;

use crate::background::{RevalidationHook, RevalidationOutcome};
use crate::context::StrategyContext;

pub const ORIGIN: &str = "https://notes.example";

pub fn url(path: &str) -> Url {
    Url::parse(ORIGIN).unwrap().join(path).unwrap()
}

pub fn get(path: &str) -> InterceptedRequest {
    InterceptedRequest::get(url(path))
}

pub fn navigate(path: &str) -> InterceptedRequest {
    InterceptedRequest::navigate(url(path))
}

pub fn request(method: Method, path: &str) -> InterceptedRequest {
    InterceptedRequest::new(method, url(path))
}

pub fn key(path: &str) -> RequestKey {
    RequestKey::get(&url(path))
}

pub struct Fixture {
    pub ctx: StrategyContext,
    pub store: CacheStore,
}

/// Context over an empty `thynkah-v3` memory store with `/browse`, `/` fallbacks.
pub fn fixture<N: Network + 'static>(network: Arc<N>, hook: Option<Arc<ChannelHook>>) -> Fixture {
    let storage = Arc::new(MemoryCacheStorage::new());
    let store = CacheStore::new(storage, CacheVersion::new("thynkah-v3"));
    let mut ctx = StrategyContext::new(network, store.clone())
        .with_fallbacks(vec![key("/browse"), key("/")]);
    if let Some(hook) = hook {
        ctx = ctx.with_hook(hook);
    }
    Fixture { ctx, store }
}

/// Forwards every settled background write to a channel.
pub struct ChannelHook {
    tx: mpsc::UnboundedSender<(RequestKey, RevalidationOutcome)>,
}

impl ChannelHook {
    pub fn new() -> (
        Arc<Self>,
        mpsc::UnboundedReceiver<(RequestKey, RevalidationOutcome)>,
    ) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(Self { tx }), rx)
    }
}

impl RevalidationHook for ChannelHook {
    fn on_settled(&self, key: &RequestKey, outcome: &RevalidationOutcome) {
        let _ = self.tx.send((key.clone(), outcome.clone()));
    }
}

/// A network whose fetches block until `open` is called.
pub struct GatedNetwork {
    response: Response,
    opened: AtomicBool,
    gate: Notify,
}

impl GatedNetwork {
    pub fn new(response: Response) -> Self {
        Self {
            response,
            opened: AtomicBool::new(false),
            gate: Notify::new(),
        }
    }

    pub fn open(&self) {
        self.opened.store(true, Ordering::SeqCst);
        self.gate.notify_one();
    }
}

#[async_trait]
impl Network for GatedNetwork {
    async fn fetch(&self, _request: &InterceptedRequest) -> Result<Response, FetchError> {
        if !self.opened.load(Ordering::SeqCst) {
            self.gate.notified().await;
        }
        Ok(self.response.clone())
    }
}
