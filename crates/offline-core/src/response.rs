//! Response snapshots.

use bytes::Bytes;
use http::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use http::{HeaderMap, StatusCode};

/// Body of the synthetic response returned for offline non-GET requests.
pub const OFFLINE_BODY: &str = r#"{"error":"OFFLINE"}"#;

/// A complete HTTP response: live, cached, or synthetic.
///
/// Cloning is cheap; the body is reference counted.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    /// Status code.
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
    /// Response body.
    pub body: Bytes,
}

impl Response {
    /// Create an empty response with the given status.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    /// Create a 200 response with a body.
    pub fn ok(body: impl Into<Bytes>) -> Self {
        Self::new(StatusCode::OK).with_body(body)
    }

    /// The synthetic offline response: 503, JSON, `{"error":"OFFLINE"}`.
    pub fn offline() -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE)
            .with_header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .with_body(OFFLINE_BODY)
    }

    /// Set the body.
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Set a header, replacing any previous value.
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Check for a 2xx status.
    pub fn is_ok(&self) -> bool {
        self.status.is_success()
    }

    /// Check for a 206 partial response.
    pub fn is_partial(&self) -> bool {
        self.status == StatusCode::PARTIAL_CONTENT
    }

    /// Content-Type header value, if any.
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
    }
}

/// Where a resolved response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseSource {
    /// Live network response.
    Network,
    /// Snapshot from the current store.
    Cache,
    /// Generated locally (offline stub).
    Synthetic,
}

impl ResponseSource {
    /// Lowercase name, used in logs and headers.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Cache => "cache",
            Self::Synthetic => "synthetic",
        }
    }
}

impl std::fmt::Display for ResponseSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offline_response_wire_format() {
        let response = Response::offline();

        assert_eq!(response.status.as_u16(), 503);
        assert_eq!(response.content_type(), Some("application/json"));
        assert_eq!(&response.body[..], br#"{"error":"OFFLINE"}"#);
    }

    #[test]
    fn test_offline_body_is_valid_json() {
        let value: serde_json::Value = serde_json::from_str(OFFLINE_BODY).unwrap();
        assert_eq!(value, serde_json::json!({"error": "OFFLINE"}));
    }

    #[test]
    fn test_response_status_helpers() {
        assert!(Response::ok("hi").is_ok());
        assert!(!Response::new(StatusCode::NOT_FOUND).is_ok());
        assert!(Response::new(StatusCode::PARTIAL_CONTENT).is_partial());
    }

    #[test]
    fn test_response_source_display() {
        assert_eq!(ResponseSource::Cache.to_string(), "cache");
        assert_eq!(ResponseSource::Synthetic.name(), "synthetic");
    }
}
