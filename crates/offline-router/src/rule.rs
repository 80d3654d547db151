//! Ordered classification rules.

use http::Method;
use offline_core::{InterceptedRequest, OfflineConfig, StaticAssetRules};

use crate::strategy::Strategy;

/// A predicate paired with the strategy it selects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule {
    /// Method other than GET.
    NonGet,
    /// Full-page navigation.
    Navigation,
    /// URL path matches the static asset predicate.
    StaticAsset(StaticAssetRules),
    /// Matches everything.
    CatchAll,
}

impl Rule {
    /// Check whether the request satisfies this rule.
    pub fn matches(&self, request: &InterceptedRequest) -> bool {
        match self {
            Self::NonGet => request.method != Method::GET,
            Self::Navigation => request.is_navigation(),
            Self::StaticAsset(rules) => rules.matches(request.path()),
            Self::CatchAll => true,
        }
    }

    /// Strategy selected when this rule matches.
    pub fn strategy(&self) -> Strategy {
        match self {
            Self::NonGet => Strategy::NetworkOnlyWithStub,
            Self::Navigation => Strategy::NetworkFirstNavigation,
            Self::StaticAsset(_) => Strategy::CacheFirstRevalidate,
            Self::CatchAll => Strategy::NetworkFirst,
        }
    }
}

/// Classifies requests by the first matching rule.
#[derive(Debug, Clone)]
pub struct Router {
    rules: Vec<Rule>,
}

impl Router {
    /// Standard precedence: non-GET, navigation, static asset, catch-all.
    pub fn new(static_assets: StaticAssetRules) -> Self {
        Self {
            rules: vec![
                Rule::NonGet,
                Rule::Navigation,
                Rule::StaticAsset(static_assets),
                Rule::CatchAll,
            ],
        }
    }

    /// Build the standard router from configuration.
    pub fn from_config(config: &OfflineConfig) -> Self {
        Self::new(config.static_assets.clone())
    }

    /// Rules in evaluation order.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Pick the strategy for a request.
    pub fn classify(&self, request: &InterceptedRequest) -> Strategy {
        self.rules
            .iter()
            .find(|rule| rule.matches(request))
            .map(Rule::strategy)
            .unwrap_or(Strategy::NetworkFirst)
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new(StaticAssetRules::default())
    }
}
