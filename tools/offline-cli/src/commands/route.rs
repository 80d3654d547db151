//! Request classification.

use anyhow::Result;
use offline_core::{InterceptedRequest, RequestMode};
use offline_router::{Router, Rule, Strategy};
use serde::Serialize;

use super::{parse_method, resolve_url, RouteArgs};
use crate::context::Context;

#[derive(Serialize)]
struct RouteReport {
    method: String,
    url: String,
    navigate: bool,
    strategy: String,
    rule: usize,
    order: &'static str,
    writes_cache: bool,
}

/// Run the route command.
pub async fn run(args: RouteArgs, ctx: &Context) -> Result<()> {
    let url = resolve_url(ctx, &args.url)?;
    let mut request = InterceptedRequest::new(parse_method(&args.method)?, url);
    if args.navigate {
        request = request.with_mode(RequestMode::Navigate);
    }

    let router = Router::from_config(&ctx.config.offline);
    let strategy = router.classify(&request);
    let (rule, label) = router
        .rules()
        .iter()
        .enumerate()
        .find(|(_, rule)| rule.matches(&request))
        .map(|(i, rule)| (i + 1, rule_label(rule)))
        .unwrap_or((router.rules().len(), "catch-all"));

    if ctx.output.is_json() {
        ctx.output.json(&RouteReport {
            method: request.method.to_string(),
            url: request.url.to_string(),
            navigate: args.navigate,
            strategy: strategy.name().to_string(),
            rule,
            order: lookup_order(strategy),
            writes_cache: strategy.writes_cache(),
        });
        return Ok(());
    }

    ctx.output.kv("request", &format!("{} {}", request.method, request.url));
    ctx.output.kv("rule", &format!("{} ({})", rule, label));
    ctx.output.kv("order", lookup_order(strategy));
    ctx.output.kv(
        "writes cache",
        if strategy.writes_cache() { "yes" } else { "no" },
    );
    ctx.output.success(strategy.name());

    Ok(())
}

fn rule_label(rule: &Rule) -> &'static str {
    match rule {
        Rule::NonGet => "method is not GET",
        Rule::Navigation => "navigation",
        Rule::StaticAsset(_) => "static asset path",
        Rule::CatchAll => "catch-all",
    }
}

fn lookup_order(strategy: Strategy) -> &'static str {
    match strategy {
        Strategy::NetworkOnlyWithStub => "network, then offline stub",
        s if s.is_network_first() => "network, then cache",
        _ => "cache, then network",
    }
}
