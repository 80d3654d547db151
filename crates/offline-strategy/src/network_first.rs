//! Network-first strategies: navigations and the default GET path.

use offline_cache::RequestKey;
use offline_core::InterceptedRequest;
use offline_router::Strategy;
use tracing::debug;

use crate::context::StrategyContext;
use crate::error::ResolveError;
use crate::resolver::Resolution;

/// Navigation: live page first, then the cached page, then the fallback pages in order.
pub async fn resolve_navigation(
    ctx: &StrategyContext,
    request: &InterceptedRequest,
) -> Result<Resolution, ResolveError> {
    const STRATEGY: Strategy = Strategy::NetworkFirstNavigation;
    let key = RequestKey::for_request(request);

    let err = match ctx.network().fetch(request).await {
        Ok(response) => {
            ctx.write(key, response.clone()).await;
            return Ok(Resolution::network(STRATEGY, response));
        }
        Err(err) => err,
    };

    if let Some(cached) = ctx.lookup(&key).await {
        debug!(url = %request.url, "navigation served from cache");
        return Ok(Resolution::cached(STRATEGY, cached));
    }

    for fallback in ctx.fallbacks() {
        if let Some(cached) = ctx.lookup(fallback).await {
            debug!(url = %request.url, fallback = fallback.url(), "navigation served from fallback page");
            return Ok(Resolution::cached(STRATEGY, cached));
        }
    }

    Err(ResolveError::NavigationUnavailable {
        url: request.url.to_string(),
        source: err,
    })
}

/// Default GET: network first, cached copy of the same request on failure.
pub async fn resolve(
    ctx: &StrategyContext,
    request: &InterceptedRequest,
) -> Result<Resolution, ResolveError> {
    const STRATEGY: Strategy = Strategy::NetworkFirst;
    let key = RequestKey::for_request(request);

    match ctx.network().fetch(request).await {
        Ok(response) => {
            ctx.write(key, response.clone()).await;
            Ok(Resolution::network(STRATEGY, response))
        }
        Err(err) => match ctx.lookup(&key).await {
            Some(cached) => {
                debug!(url = %request.url, error = %err, "network failed, served from cache");
                Ok(Resolution::cached(STRATEGY, cached))
            }
            None => Err(ResolveError::CacheMiss {
                url: request.url.to_string(),
                source: err,
            }),
        },
    }
}
