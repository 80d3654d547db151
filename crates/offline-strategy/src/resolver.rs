//! Request resolution.

use chrono::{DateTime, Utc};
use offline_cache::CachedResponse;
use offline_core::{InterceptedRequest, Response, ResponseSource};
use offline_router::{Router, Strategy};
use tracing::{debug, debug_span, Instrument};

use crate::context::StrategyContext;
use crate::error::ResolveError;
use crate::{cache_first, network_first, network_only};

/// The single outcome of resolving a request.
#[derive(Debug, Clone)]
pub struct Resolution {
    /// Response handed back to the caller.
    pub response: Response,
    /// Where the response came from.
    pub source: ResponseSource,
    /// Strategy that produced it.
    pub strategy: Strategy,
    /// When the cached copy was written, for cache responses.
    pub stored_at: Option<DateTime<Utc>>,
}

impl Resolution {
    /// A live network response.
    pub fn network(strategy: Strategy, response: Response) -> Self {
        Self {
            response,
            source: ResponseSource::Network,
            strategy,
            stored_at: None,
        }
    }

    /// A response served from the store.
    pub fn cached(strategy: Strategy, cached: CachedResponse) -> Self {
        Self {
            response: cached.response,
            source: ResponseSource::Cache,
            strategy,
            stored_at: Some(cached.stored_at),
        }
    }

    /// Seconds since the cached copy was written.
    pub fn age_secs(&self) -> Option<u64> {
        self.stored_at
            .map(|at| (Utc::now() - at).num_seconds().max(0) as u64)
    }

    /// Take the response.
    pub fn into_response(self) -> Response {
        self.response
    }
}

/// Routes each request to its strategy.
#[derive(Debug, Clone)]
pub struct Resolver {
    router: Router,
    ctx: StrategyContext,
}

impl Resolver {
    /// Create a resolver.
    pub fn new(router: Router, ctx: StrategyContext) -> Self {
        Self { router, ctx }
    }

    /// Router.
    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Strategy context.
    pub fn context(&self) -> &StrategyContext {
        &self.ctx
    }

    /// Classify and resolve a request.
    pub async fn resolve(&self, request: &InterceptedRequest) -> Result<Resolution, ResolveError> {
        let strategy = self.router.classify(request);
        let span = debug_span!(
            "resolve",
            request_id = %request.id,
            method = %request.method,
            url = %request.url,
            strategy = strategy.name(),
        );

        async {
            let result = match strategy {
                Strategy::NetworkOnlyWithStub => Ok(network_only::resolve(&self.ctx, request).await),
                Strategy::NetworkFirstNavigation => {
                    network_first::resolve_navigation(&self.ctx, request).await
                }
                Strategy::CacheFirstRevalidate => cache_first::resolve(&self.ctx, request).await,
                Strategy::NetworkFirst => network_first::resolve(&self.ctx, request).await,
            };

            match &result {
                Ok(resolution) => debug!(
                    source = %resolution.source,
                    status = resolution.response.status.as_u16(),
                    "request resolved"
                ),
                Err(err) => debug!(error = %err, "request unresolved"),
            }

            result
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{fixture, get, key, navigate, request};
    use http::{Method, StatusCode};
    use offline_fetch::StaticNetwork;
    use std::sync::Arc;

    fn resolver(network: Arc<StaticNetwork>) -> (Resolver, crate::test_support::Fixture) {
        let fx = fixture(network, None);
        (Resolver::new(Router::default(), fx.ctx.clone()), fx)
    }

    #[tokio::test]
    async fn test_dispatches_by_classification() {
        let network = Arc::new(
            StaticNetwork::new()
                .with_route("/browse", Response::ok("browse"))
                .with_route("/css/style.css", Response::ok("css"))
                .with_route("/api/notes", Response::ok("[]")),
        );
        let (resolver, _fx) = resolver(network);

        let cases = [
            (request(Method::POST, "/api/notes"), Strategy::NetworkOnlyWithStub),
            (navigate("/browse"), Strategy::NetworkFirstNavigation),
            (get("/css/style.css"), Strategy::CacheFirstRevalidate),
            (get("/api/notes"), Strategy::NetworkFirst),
        ];

        for (req, expected) in cases {
            let resolution = resolver.resolve(&req).await.unwrap();
            assert_eq!(resolution.strategy, expected, "{}", req.url);
        }
    }

    #[tokio::test]
    async fn test_non_get_offline_never_touches_cache() {
        let (resolver, fx) = resolver(Arc::new(StaticNetwork::offline()));
        fx.store.store(key("/api/notes"), Response::ok("cached")).await.unwrap();

        let resolution = resolver
            .resolve(&request(Method::POST, "/api/notes"))
            .await
            .unwrap();

        assert_eq!(resolution.response.status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(resolution.source, ResponseSource::Synthetic);
    }

    #[tokio::test]
    async fn test_cached_resolution_reports_age() {
        let (resolver, fx) = resolver(Arc::new(StaticNetwork::offline()));
        fx.store.store(key("/api/notes"), Response::ok("[]")).await.unwrap();

        let resolution = resolver.resolve(&get("/api/notes")).await.unwrap();

        assert_eq!(resolution.source, ResponseSource::Cache);
        assert!(resolution.age_secs().unwrap() < 5);
        assert_eq!(resolution.into_response().body, "[]");
    }
}
