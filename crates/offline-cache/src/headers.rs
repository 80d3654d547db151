//! Cache debugging headers.

use http::header::{HeaderName, HeaderValue, AGE};
use http::HeaderMap;
use offline_core::{RequestId, Response, ResponseSource};
use serde::Serialize;

/// Header names for cache debugging.
pub mod header_names {
    /// Strategy class the request was routed to.
    pub const X_OFFLINE_STRATEGY: &str = "x-offline-strategy";
    /// Where the response came from (network, cache, synthetic).
    pub const X_OFFLINE_SOURCE: &str = "x-offline-source";
    /// Store consulted for the request.
    pub const X_OFFLINE_CACHE: &str = "x-offline-cache";
    /// Request ID for tracing.
    pub const X_REQUEST_ID: &str = "x-request-id";
    /// Request header that turns explain headers on for a single request.
    pub const X_DEBUG_CACHE: &str = "x-debug-cache";
}

/// Cache explain headers for debugging.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheExplainHeaders {
    /// Strategy name.
    pub strategy: Option<String>,
    /// Response source.
    pub source: Option<String>,
    /// Store name.
    pub cache: Option<String>,
    /// Age of cached response in seconds.
    pub age_secs: Option<u64>,
    /// Request ID.
    pub request_id: Option<String>,
}

impl CacheExplainHeaders {
    /// Create new explain headers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set strategy name.
    pub fn with_strategy(mut self, strategy: impl Into<String>) -> Self {
        self.strategy = Some(strategy.into());
        self
    }

    /// Set response source.
    pub fn with_source(mut self, source: ResponseSource) -> Self {
        self.source = Some(source.name().to_string());
        self
    }

    /// Set store name.
    pub fn with_cache(mut self, cache: impl Into<String>) -> Self {
        self.cache = Some(cache.into());
        self
    }

    /// Set age.
    pub fn with_age(mut self, age_secs: u64) -> Self {
        self.age_secs = Some(age_secs);
        self
    }

    /// Set request ID.
    pub fn with_request_id(mut self, id: &RequestId) -> Self {
        self.request_id = Some(id.to_string());
        self
    }

    /// Convert to header pairs.
    pub fn to_headers(&self) -> Vec<(String, String)> {
        let mut headers = Vec::new();

        if let Some(strategy) = &self.strategy {
            headers.push((header_names::X_OFFLINE_STRATEGY.to_string(), strategy.clone()));
        }

        if let Some(source) = &self.source {
            headers.push((header_names::X_OFFLINE_SOURCE.to_string(), source.clone()));
        }

        if let Some(cache) = &self.cache {
            headers.push((header_names::X_OFFLINE_CACHE.to_string(), cache.clone()));
        }

        if let Some(age) = self.age_secs {
            headers.push((AGE.as_str().to_string(), age.to_string()));
        }

        if let Some(id) = &self.request_id {
            headers.push((header_names::X_REQUEST_ID.to_string(), id.clone()));
        }

        headers
    }

    /// Attach the headers to a response. Values that are not valid header text are skipped.
    pub fn apply(&self, response: &mut Response) {
        for (name, value) in self.to_headers() {
            let (Ok(name), Ok(value)) = (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(&value),
            ) else {
                continue;
            };
            response.headers.insert(name, value);
        }
    }

    /// Convert to JSON for debugging output.
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Check whether a request asked for explain headers (`X-Debug-Cache: 1`).
pub fn should_include_debug_headers(request_headers: &HeaderMap) -> bool {
    request_headers
        .get(header_names::X_DEBUG_CACHE)
        .is_some_and(|v| v.as_bytes() == b"1")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explain_headers_to_headers() {
        let headers = CacheExplainHeaders::new()
            .with_strategy("cache-first-revalidate")
            .with_source(ResponseSource::Cache)
            .with_cache("thynkah-v3")
            .with_age(42)
            .to_headers();

        assert_eq!(headers.len(), 4);
        assert!(headers.contains(&("x-offline-source".to_string(), "cache".to_string())));
        assert!(headers.contains(&("age".to_string(), "42".to_string())));
    }

    #[test]
    fn test_explain_headers_apply() {
        let mut response = Response::ok("hi");
        CacheExplainHeaders::new()
            .with_strategy("network-first")
            .with_source(ResponseSource::Network)
            .apply(&mut response);

        assert_eq!(
            response.headers.get("x-offline-strategy").unwrap(),
            "network-first"
        );
        assert_eq!(response.headers.get("x-offline-source").unwrap(), "network");
        assert!(response.headers.get("age").is_none());
    }

    #[test]
    fn test_should_include_debug_headers() {
        let mut headers = HeaderMap::new();
        assert!(!should_include_debug_headers(&headers));

        headers.insert("x-debug-cache", HeaderValue::from_static("1"));
        assert!(should_include_debug_headers(&headers));

        headers.insert("x-debug-cache", HeaderValue::from_static("0"));
        assert!(!should_include_debug_headers(&headers));
    }

    #[test]
    fn test_explain_headers_json() {
        let json = CacheExplainHeaders::new().with_cache("v1").to_json();
        assert!(json.contains("\"cache\": \"v1\""));
    }
}
