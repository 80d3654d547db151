//! Offline CLI - Command line tool for the offline cache manager.
//!
//! Commands:
//! - `offline config` - Show, initialize and validate configuration
//! - `offline route` - Show which strategy a request is routed to
//! - `offline simulate` - Run install, activate and fetches against an in-memory network

mod commands;
mod config;
mod context;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use offline_observability::{init_logging, LogFormat};

use commands::{ConfigArgs, RouteArgs, SimulateArgs};

/// Offline CLI - Inspect and simulate offline caching behavior
#[derive(Parser)]
#[command(name = "offline")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use JSON output format
    #[arg(long, global = true)]
    json: bool,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage configuration
    Config(ConfigArgs),

    /// Classify a request without resolving it
    Route(RouteArgs),

    /// Simulate a worker lifecycle against an in-memory network
    Simulate(SimulateArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup output formatting
    let output = output::Output::new(cli.verbose, cli.json);

    // Load config
    let config_path = cli.config.as_deref();
    let ctx = match context::Context::load(config_path, output.clone()) {
        Ok(ctx) => ctx,
        Err(e) => {
            output.error(&format!("{:#}", e));
            std::process::exit(1);
        }
    };

    let format = if cli.json {
        LogFormat::Json
    } else {
        ctx.config.log.format
    };
    let filter = if cli.verbose {
        "debug"
    } else {
        ctx.config.log.filter.as_str()
    };
    if let Err(e) = init_logging(format, filter) {
        ctx.output.warn(&format!("{}", e));
    }

    // Execute command
    let result = match cli.command {
        Commands::Config(args) => commands::config::run(args, &ctx).await,
        Commands::Route(args) => commands::route::run(args, &ctx).await,
        Commands::Simulate(args) => commands::simulate::run(args, &ctx).await,
    };

    if let Err(e) = result {
        ctx.output.error(&format!("{:#}", e));
        std::process::exit(1);
    }

    Ok(())
}
