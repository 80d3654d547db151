//! Request identity used as the store key.

use http::Method;
use offline_core::InterceptedRequest;
use url::Url;

/// Identity of a cached request: method plus URL.
///
/// The fragment is dropped and the body is ignored, so two GETs for the
/// same resource always share a key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestKey {
    method: Method,
    url: String,
}

impl RequestKey {
    /// Create a key from a method and URL.
    pub fn new(method: Method, url: &Url) -> Self {
        let mut url = url.clone();
        url.set_fragment(None);
        Self {
            method,
            url: url.into(),
        }
    }

    /// Create a GET key.
    pub fn get(url: &Url) -> Self {
        Self::new(Method::GET, url)
    }

    /// Create the key for an intercepted request.
    pub fn for_request(request: &InterceptedRequest) -> Self {
        Self::new(request.method.clone(), &request.url)
    }

    /// HTTP method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Normalized URL string.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Check if the key may be stored.
    pub fn is_cacheable(&self) -> bool {
        self.method == Method::GET
    }
}

impl std::fmt::Display for RequestKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}
