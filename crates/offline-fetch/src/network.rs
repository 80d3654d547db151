//! The network seam.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use offline_core::{InterceptedRequest, Response};

/// Error type for fetch operations.
///
/// Only transport failures are errors; an HTTP error status is still a
/// response.
#[derive(Debug, Clone, thiserror::Error)]
pub enum FetchError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Request error: {0}")]
    Request(String),
}

/// Host network used by every strategy.
#[async_trait]
pub trait Network: Send + Sync {
    /// Send a request and wait for the full response.
    async fn fetch(&self, request: &InterceptedRequest) -> Result<Response, FetchError>;
}

#[async_trait]
impl<N: Network + ?Sized> Network for Arc<N> {
    async fn fetch(&self, request: &InterceptedRequest) -> Result<Response, FetchError> {
        (**self).fetch(request).await
    }
}
