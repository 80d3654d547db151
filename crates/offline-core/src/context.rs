//! Intercepted requests.

use std::sync::atomic::{AtomicU64, Ordering};

use bytes::Bytes;
use http::{HeaderMap, Method};
use url::Url;

/// Unique request identifier for tracing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestId(pub String);

static NEXT_REQUEST: AtomicU64 = AtomicU64::new(1);

impl RequestId {
    /// Generate a new request ID.
    pub fn generate() -> Self {
        let seq = NEXT_REQUEST.fetch_add(1, Ordering::Relaxed);
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        Self(format!("{:x}-{:x}", nanos, seq))
    }

    /// Create from an existing ID string.
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Request mode as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestMode {
    /// Full document load.
    Navigate,
    /// Same-origin subresource.
    #[default]
    SameOrigin,
    /// Cross-origin subresource with CORS.
    Cors,
    /// Opaque cross-origin subresource.
    NoCors,
}

/// A request handed over by the host for resolution.
///
/// Read-only for the router and resolvers.
#[derive(Debug, Clone)]
pub struct InterceptedRequest {
    /// Unique request identifier.
    pub id: RequestId,
    /// HTTP method.
    pub method: Method,
    /// Absolute request URL.
    pub url: Url,
    /// Request mode.
    pub mode: RequestMode,
    /// Request headers.
    pub headers: HeaderMap,
    /// Request body (forwarded to the network only).
    pub body: Bytes,
}

impl InterceptedRequest {
    /// Create a new subresource request.
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            id: RequestId::generate(),
            method,
            url,
            mode: RequestMode::default(),
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    /// Create a GET subresource request.
    pub fn get(url: Url) -> Self {
        Self::new(Method::GET, url)
    }

    /// Create a GET navigation request.
    pub fn navigate(url: Url) -> Self {
        Self::get(url).with_mode(RequestMode::Navigate)
    }

    /// Parse the URL and create a request.
    pub fn parse(method: Method, url: &str) -> Result<Self, url::ParseError> {
        Ok(Self::new(method, Url::parse(url)?))
    }

    /// Set the request mode.
    pub fn with_mode(mut self, mode: RequestMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the request body.
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Set the request ID.
    pub fn with_id(mut self, id: RequestId) -> Self {
        self.id = id;
        self
    }

    /// Check if this is a full-page navigation.
    pub fn is_navigation(&self) -> bool {
        self.mode == RequestMode::Navigate
    }

    /// Check if this is a GET request.
    pub fn is_get(&self) -> bool {
        self.method == Method::GET
    }

    /// URL path component.
    pub fn path(&self) -> &str {
        self.url.path()
    }
}
