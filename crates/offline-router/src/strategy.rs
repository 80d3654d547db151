//! Strategy classes.

use serde::{Deserialize, Serialize};

/// Resolution algorithm selected for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// Non-GET: network only, synthetic 503 when offline. Never cached.
    NetworkOnlyWithStub,
    /// Navigation: network first, then exact cache, then fallback pages.
    NetworkFirstNavigation,
    /// Static asset: cached copy immediately, refreshed in the background.
    CacheFirstRevalidate,
    /// Any other GET: network first, then exact cache.
    NetworkFirst,
}

impl Strategy {
    /// All strategies in precedence order.
    pub const ALL: [Strategy; 4] = [
        Self::NetworkOnlyWithStub,
        Self::NetworkFirstNavigation,
        Self::CacheFirstRevalidate,
        Self::NetworkFirst,
    ];

    /// Kebab-case name, used in logs and headers.
    pub fn name(&self) -> &'static str {
        match self {
            Self::NetworkOnlyWithStub => "network-only-with-stub",
            Self::NetworkFirstNavigation => "network-first-navigation",
            Self::CacheFirstRevalidate => "cache-first-revalidate",
            Self::NetworkFirst => "network-first",
        }
    }

    /// Check whether this strategy writes successful fetches to the store.
    pub fn writes_cache(&self) -> bool {
        !matches!(self, Self::NetworkOnlyWithStub)
    }

    /// Check whether the network is consulted before the cache.
    pub fn is_network_first(&self) -> bool {
        !matches!(self, Self::CacheFirstRevalidate)
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|strategy| strategy.name() == s)
            .ok_or_else(|| format!("unknown strategy: {}", s))
    }
}
