//! CLI command implementations.

pub mod config;
pub mod route;
pub mod simulate;

use anyhow::{Context as _, Result};
use clap::{Args, Subcommand};
use url::Url;

use crate::context::Context;

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration.
    Show,
    /// Get a config value.
    Get {
        /// Config key (dot-separated).
        key: String,
    },
    /// Initialize a new config file.
    Init {
        /// Force overwrite existing config.
        #[arg(short, long)]
        force: bool,

        /// Cache version to start with.
        #[arg(long, default_value = crate::config::DEFAULT_CACHE_VERSION)]
        cache_version: String,

        /// Origin the shell paths are served from.
        #[arg(long, default_value = crate::config::DEFAULT_ORIGIN)]
        origin: String,
    },
    /// Validate the config file.
    Validate,
}

/// Arguments for the route command.
#[derive(Args)]
pub struct RouteArgs {
    /// URL or path to classify (paths are resolved against the origin).
    pub url: String,

    /// HTTP method.
    #[arg(short = 'X', long, default_value = "GET")]
    pub method: String,

    /// Treat the request as a full-page navigation.
    #[arg(short, long)]
    pub navigate: bool,
}

/// Arguments for the simulate command.
#[derive(Args)]
pub struct SimulateArgs {
    /// Paths to request after activation.
    #[arg(default_value = "/")]
    pub paths: Vec<String>,

    /// Take the network down after install.
    #[arg(long)]
    pub offline: bool,

    /// Pre-existing store from an earlier version (repeatable).
    #[arg(long = "stale", value_name = "NAME")]
    pub stale: Vec<String>,

    /// Send every request as a full-page navigation.
    #[arg(short, long)]
    pub navigate: bool,

    /// HTTP method for every request.
    #[arg(short = 'X', long, default_value = "GET")]
    pub method: String,

    /// Attach explain headers to every response.
    #[arg(long)]
    pub explain: bool,
}

/// Resolve a URL or absolute path against the configured origin.
pub fn resolve_url(ctx: &Context, input: &str) -> Result<Url> {
    if input.starts_with('/') {
        Ok(ctx.config.offline.resolve(input)?)
    } else {
        Url::parse(input).with_context(|| format!("Invalid URL: {}", input))
    }
}

/// Parse an HTTP method name.
pub fn parse_method(method: &str) -> Result<http::Method> {
    http::Method::from_bytes(method.to_ascii_uppercase().as_bytes())
        .with_context(|| format!("Invalid HTTP method: {}", method))
}
