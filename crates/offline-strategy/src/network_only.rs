//! Network-only with an offline stub, for non-GET requests.

use offline_core::{InterceptedRequest, Response, ResponseSource};
use offline_router::Strategy;
use tracing::debug;

use crate::context::StrategyContext;
use crate::resolver::Resolution;

/// Forward the request to the network. The store is never read or written.
///
/// A network failure becomes the synthetic 503 `{"error":"OFFLINE"}`
/// response, so this never fails.
pub async fn resolve(ctx: &StrategyContext, request: &InterceptedRequest) -> Resolution {
    match ctx.network().fetch(request).await {
        Ok(response) => Resolution::network(Strategy::NetworkOnlyWithStub, response),
        Err(err) => {
            debug!(method = %request.method, url = %request.url, error = %err, "network failed, returning offline stub");
            Resolution {
                response: Response::offline(),
                source: ResponseSource::Synthetic,
                strategy: Strategy::NetworkOnlyWithStub,
                stored_at: None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{fixture, request};
    use http::{Method, StatusCode};
    use offline_fetch::StaticNetwork;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_online_passes_response_through_unmodified() {
        let created = Response::new(StatusCode::CREATED).with_body(r#"{"id":7}"#);
        let network = Arc::new(StaticNetwork::new().with_route("/api/notes", created.clone()));
        let fx = fixture(network, None);

        let req = request(Method::POST, "/api/notes").with_body(r#"{"text":"hi"}"#);
        let resolution = resolve(&fx.ctx, &req).await;

        assert_eq!(resolution.source, ResponseSource::Network);
        assert_eq!(resolution.response, created);
        assert_eq!(fx.store.len().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_offline_returns_stub() {
        let fx = fixture(Arc::new(StaticNetwork::offline()), None);

        for method in [Method::POST, Method::PUT, Method::DELETE, Method::PATCH] {
            let resolution = resolve(&fx.ctx, &request(method, "/api/notes/3")).await;

            assert_eq!(resolution.source, ResponseSource::Synthetic);
            assert_eq!(resolution.response.status, StatusCode::SERVICE_UNAVAILABLE);
            assert_eq!(resolution.response.content_type(), Some("application/json"));
            assert_eq!(&resolution.response.body[..], br#"{"error":"OFFLINE"}"#);
        }
    }

    #[tokio::test]
    async fn test_server_error_is_not_replaced() {
        let network = Arc::new(
            StaticNetwork::new()
                .with_route("/api/notes", Response::new(StatusCode::INTERNAL_SERVER_ERROR)),
        );
        let fx = fixture(network, None);

        let resolution = resolve(&fx.ctx, &request(Method::POST, "/api/notes")).await;

        assert_eq!(resolution.response.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(resolution.source, ResponseSource::Network);
    }
}
