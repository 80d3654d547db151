//! Resolution errors.

use offline_fetch::FetchError;

/// A request that could not be answered from the network or the cache.
///
/// Network failures alone are never surfaced; every variant means the
/// fallback the strategy relies on was missing too.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// Network-first GET failed and the exact request is not cached.
    #[error("Network failed for {url} and nothing is cached for it")]
    CacheMiss {
        url: String,
        #[source]
        source: FetchError,
    },

    /// Static asset not cached and the network failed.
    #[error("Asset {url} is not cached and the network failed")]
    AssetUnavailable {
        url: String,
        #[source]
        source: FetchError,
    },

    /// Offline navigation with neither the page nor any fallback cached.
    #[error("Navigation to {url} failed offline and no fallback page is cached")]
    NavigationUnavailable {
        url: String,
        #[source]
        source: FetchError,
    },
}

impl ResolveError {
    /// URL of the request that failed.
    pub fn url(&self) -> &str {
        match self {
            Self::CacheMiss { url, .. }
            | Self::AssetUnavailable { url, .. }
            | Self::NavigationUnavailable { url, .. } => url,
        }
    }

    /// Underlying network failure.
    pub fn fetch_error(&self) -> &FetchError {
        match self {
            Self::CacheMiss { source, .. }
            | Self::AssetUnavailable { source, .. }
            | Self::NavigationUnavailable { source, .. } => source,
        }
    }
}
