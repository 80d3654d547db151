//! In-memory network for development and tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, RwLock};

use async_trait::async_trait;
use http::StatusCode;
use offline_core::{InterceptedRequest, Response};
use tracing::trace;

use crate::network::{FetchError, Network};

/// A network serving fixed responses by path, with an online switch.
///
/// Unknown paths answer 404 like a real server would. While offline every
/// fetch fails with `FetchError::Connection`.
#[derive(Debug)]
pub struct StaticNetwork {
    routes: RwLock<HashMap<String, Response>>,
    online: AtomicBool,
    calls: AtomicUsize,
    log: Mutex<Vec<String>>,
}

impl Default for StaticNetwork {
    fn default() -> Self {
        Self::new()
    }
}

impl StaticNetwork {
    /// Create an online network with no routes.
    pub fn new() -> Self {
        Self {
            routes: RwLock::new(HashMap::new()),
            online: AtomicBool::new(true),
            calls: AtomicUsize::new(0),
            log: Mutex::new(Vec::new()),
        }
    }

    /// Create a network that is offline from the start.
    pub fn offline() -> Self {
        let network = Self::new();
        network.set_online(false);
        network
    }

    /// Add a route (builder style).
    pub fn with_route(self, path: impl Into<String>, response: Response) -> Self {
        self.set_route(path, response);
        self
    }

    /// Add or replace a route. `path` may include a query string.
    pub fn set_route(&self, path: impl Into<String>, response: Response) {
        if let Ok(mut routes) = self.routes.write() {
            routes.insert(path.into(), response);
        }
    }

    /// Switch connectivity.
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    /// Current connectivity.
    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    /// Total number of fetch attempts, online or not.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Number of fetch attempts for a path.
    pub fn calls_for(&self, path: &str) -> usize {
        self.log
            .lock()
            .map(|log| log.iter().filter(|p| p.as_str() == path).count())
            .unwrap_or(0)
    }

    fn route_key(request: &InterceptedRequest) -> String {
        match request.url.query() {
            Some(query) => format!("{}?{}", request.url.path(), query),
            None => request.url.path().to_string(),
        }
    }
}

#[async_trait]
impl Network for StaticNetwork {
    async fn fetch(&self, request: &InterceptedRequest) -> Result<Response, FetchError> {
        let key = Self::route_key(request);
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut log) = self.log.lock() {
            log.push(key.clone());
        }

        if !self.is_online() {
            trace!(url = %request.url, "static network offline");
            return Err(FetchError::Connection("network unreachable".to_string()));
        }

        let routes = self
            .routes
            .read()
            .map_err(|_| FetchError::Request("route table lock poisoned".to_string()))?;

        Ok(routes
            .get(&key)
            .cloned()
            .unwrap_or_else(|| Response::new(StatusCode::NOT_FOUND).with_body("Not Found")))
    }
}
