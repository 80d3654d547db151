//! Timeouts for network fetches.

use std::time::Duration;

use async_trait::async_trait;
use offline_core::{InterceptedRequest, Response};
use tracing::warn;

use crate::network::{FetchError, Network};

/// Network wrapper failing any fetch that takes longer than `limit`.
///
/// A timed-out fetch is a network failure, so strategies fall back to
/// the cache exactly as they would for a connection error.
#[derive(Debug, Clone)]
pub struct TimeoutNetwork<N> {
    inner: N,
    limit: Duration,
}

impl<N: Network> TimeoutNetwork<N> {
    /// Wrap a network.
    pub fn new(inner: N, limit: Duration) -> Self {
        Self { inner, limit }
    }

    /// Configured limit.
    pub fn limit(&self) -> Duration {
        self.limit
    }
}

#[async_trait]
impl<N: Network> Network for TimeoutNetwork<N> {
    async fn fetch(&self, request: &InterceptedRequest) -> Result<Response, FetchError> {
        match tokio::time::timeout(self.limit, self.inner.fetch(request)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    url = %request.url,
                    timeout_ms = self.limit.as_millis() as u64,
                    "fetch timed out"
                );
                Err(FetchError::Timeout(self.limit))
            }
        }
    }
}
