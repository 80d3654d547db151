//! Cache-first with background revalidation, for static assets.

use std::sync::Arc;

use offline_cache::RequestKey;
use offline_core::InterceptedRequest;
use offline_router::Strategy;
use tracing::debug;

use crate::context::StrategyContext;
use crate::error::ResolveError;
use crate::resolver::Resolution;

const STRATEGY: Strategy = Strategy::CacheFirstRevalidate;

/// Serve the cached copy without waiting on the network.
///
/// On a hit the refresh fetch and its write run detached, so the caller
/// gets the cached copy even if it is stale and the network is slow. On a
/// miss the fetch runs in the foreground and only the write is detached.
pub async fn resolve(
    ctx: &StrategyContext,
    request: &InterceptedRequest,
) -> Result<Resolution, ResolveError> {
    let key = RequestKey::for_request(request);

    if let Some(cached) = ctx.lookup(&key).await {
        debug!(url = %request.url, age_secs = cached.age_secs(), "asset served from cache, revalidating");
        ctx.background()
            .refresh(Arc::clone(ctx.network()), request.clone());
        return Ok(Resolution::cached(STRATEGY, cached));
    }

    match ctx.network().fetch(request).await {
        Ok(response) => {
            ctx.background().write(key, response.clone());
            Ok(Resolution::network(STRATEGY, response))
        }
        Err(err) => Err(ResolveError::AssetUnavailable {
            url: request.url.to_string(),
            source: err,
        }),
    }
}
