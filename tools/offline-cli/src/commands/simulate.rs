//! Offline simulation.
//!
//! Runs a worker against an in-memory network that serves every shell path
//! and every requested path, then resolves the requests in order.

use std::sync::Arc;

use anyhow::{Context as _, Result};
use offline_cache::{CacheStorage, MemoryCacheStorage, RequestKey};
use offline_core::{CacheVersion, InterceptedRequest, RequestMode, Response};
use offline_fetch::StaticNetwork;
use offline_observability::MetricsSnapshot;
use offline_strategy::Resolution;
use offline_worker::{ClientRegistry, OfflineWorker, WorkerError};
use serde::Serialize;
use tracing::debug;

use super::{parse_method, resolve_url, SimulateArgs};
use crate::context::Context;

#[derive(Serialize)]
struct SimulationReport {
    cache: String,
    installed_entries: usize,
    skip_waiting: bool,
    deleted: Vec<String>,
    claimed: usize,
    offline: bool,
    requests: Vec<RequestOutcome>,
    metrics: MetricsSnapshot,
}

#[derive(Serialize)]
struct RequestOutcome {
    method: String,
    path: String,
    strategy: String,
    source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    bytes: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl RequestOutcome {
    fn resolved(request: &InterceptedRequest, path: &str, resolution: &Resolution) -> Self {
        Self {
            method: request.method.to_string(),
            path: path.to_string(),
            strategy: resolution.strategy.name().to_string(),
            source: resolution.source.name().to_string(),
            status: Some(resolution.response.status.as_u16()),
            bytes: Some(resolution.response.body.len()),
            error: None,
        }
    }
}

/// Run the simulate command.
pub async fn run(args: SimulateArgs, ctx: &Context) -> Result<()> {
    let mut config = ctx.config.offline.clone();
    config.debug_headers |= args.explain;
    let method = parse_method(&args.method)?;

    let network = Arc::new(StaticNetwork::new());
    for path in config.shell.iter().chain(args.paths.iter().map(String::as_str)) {
        network.set_route(route_path(ctx, path)?, page(path));
    }

    // Earlier versions leave a store behind and a session controlled by it.
    let storage = Arc::new(MemoryCacheStorage::new());
    let clients = Arc::new(ClientRegistry::new());
    let root = RequestKey::get(&config.resolve("/")?);
    for name in &args.stale {
        storage
            .put(name, root.clone(), Response::ok(format!("stale {}", name)))
            .await
            .with_context(|| format!("Failed to seed stale cache {}", name))?;
        clients.open_controlled(CacheVersion::new(name.as_str()));
    }

    let worker = OfflineWorker::builder(config, network.clone())
        .storage(storage)
        .clients(clients)
        .build()?;

    ctx.output.header(&format!("Simulating {}", worker.store().name()));

    let spinner = ctx.output.spinner("Preloading shell...");
    let installed = worker.install().await;
    spinner.finish_and_clear();
    let install = installed?;
    ctx.output.step(
        1,
        3,
        &format!("install: {} entries cached in {}", install.entries, install.cache),
    );

    let reconcile = worker.activate().await?;
    ctx.output.step(
        2,
        3,
        &format!(
            "activate: {} stale cache(s) deleted, {} client(s) claimed",
            reconcile.deleted.len(),
            reconcile.claimed
        ),
    );
    for name in &reconcile.deleted {
        ctx.output.debug(&format!("deleted {}", name));
    }
    for (name, err) in &reconcile.failed {
        ctx.output.warn(&format!("could not delete {}: {}", name, err));
    }

    if args.offline {
        network.set_online(false);
    }
    ctx.output.step(
        3,
        3,
        &format!(
            "fetch: {} request(s), network {}",
            args.paths.len(),
            if args.offline { "down" } else { "up" }
        ),
    );

    let router = worker.router().clone();
    let mut outcomes = Vec::with_capacity(args.paths.len());
    for path in &args.paths {
        let mut request = InterceptedRequest::new(method.clone(), resolve_url(ctx, path)?);
        if args.navigate {
            request = request.with_mode(RequestMode::Navigate);
        }
        let strategy = router.classify(&request);

        let outcome = match worker.resolve(&request).await {
            Ok(resolution) => {
                if args.explain {
                    log_explain_headers(path, &resolution);
                }
                RequestOutcome::resolved(&request, path, &resolution)
            }
            Err(WorkerError::Resolve(err)) => RequestOutcome {
                method: request.method.to_string(),
                path: path.clone(),
                strategy: strategy.name().to_string(),
                source: "failed".to_string(),
                status: None,
                bytes: None,
                error: Some(err.to_string()),
            },
            Err(err) => return Err(err.into()),
        };
        outcomes.push(outcome);
    }

    let report = SimulationReport {
        cache: install.cache,
        installed_entries: install.entries,
        skip_waiting: install.skip_waiting,
        deleted: reconcile.deleted,
        claimed: reconcile.claimed,
        offline: args.offline,
        requests: outcomes,
        metrics: worker.metrics().snapshot(),
    };

    if ctx.output.is_json() {
        ctx.output.json(&report);
        return Ok(());
    }

    print_table(ctx, &report);
    Ok(())
}

fn log_explain_headers(path: &str, resolution: &Resolution) {
    for (name, value) in resolution.response.headers.iter() {
        debug!(
            path,
            header = %name,
            value = value.to_str().unwrap_or("<binary>"),
            "explain header"
        );
    }
}

fn print_table(ctx: &Context, report: &SimulationReport) {
    let widths = [7, 28, 26, 10, 6];

    ctx.output.blank();
    ctx.output
        .table_row(&["METHOD", "PATH", "STRATEGY", "SOURCE", "STATUS"], &widths);
    for outcome in &report.requests {
        let status = outcome
            .status
            .map(|s| s.to_string())
            .unwrap_or_else(|| "-".to_string());
        ctx.output.table_row(
            &[
                outcome.method.as_str(),
                outcome.path.as_str(),
                outcome.strategy.as_str(),
                ctx.output.source_badge(&outcome.source, widths[3]).as_str(),
                status.as_str(),
            ],
            &widths,
        );
        if let Some(error) = &outcome.error {
            ctx.output.warn(&format!("{}: {}", outcome.path, error));
        }
    }

    let metrics = &report.metrics;
    ctx.output.blank();
    ctx.output.kv(
        "served",
        &format!(
            "{} network, {} cache, {} synthetic, {} failed",
            metrics.by_source.network,
            metrics.by_source.cache,
            metrics.by_source.synthetic,
            metrics.failures
        ),
    );
    ctx.output
        .kv("cache ratio", &format!("{:.0}%", metrics.cache_ratio() * 100.0));
}

/// Route key for the static network: path plus query, without the origin.
fn route_path(ctx: &Context, input: &str) -> Result<String> {
    let url = resolve_url(ctx, input)?;
    Ok(match url.query() {
        Some(query) => format!("{}?{}", url.path(), query),
        None => url.path().to_string(),
    })
}

fn page(path: &str) -> Response {
    Response::ok(format!("<!-- {} -->", path)).with_header(
        http::header::CONTENT_TYPE,
        http::HeaderValue::from_static("text/html"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use offline_router::Strategy;

    #[test]
    fn test_outcome_from_resolution() {
        let request = InterceptedRequest::get(
            url::Url::parse("https://notes.example/css/style.css").unwrap(),
        );
        let resolution = Resolution::network(Strategy::CacheFirstRevalidate, page("/css/style.css"));

        let outcome = RequestOutcome::resolved(&request, "/css/style.css", &resolution);

        assert_eq!(outcome.method, "GET");
        assert_eq!(outcome.strategy, "cache-first-revalidate");
        assert_eq!(outcome.source, "network");
        assert_eq!(outcome.status, Some(200));
        assert_eq!(outcome.bytes, Some("<!-- /css/style.css -->".len()));
        assert!(outcome.error.is_none());
    }
}
