//! Cache error types.

use http::Method;

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Cache operation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CacheError {
    /// Backend storage error.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Only GET requests are stored.
    #[error("{0} requests cannot be cached")]
    MethodNotCacheable(Method),

    /// 206 responses are never stored.
    #[error("Cannot cache partial response (206) for {0}")]
    PartialResponse(String),
}
