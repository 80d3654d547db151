//! Configuration management commands.

use std::fs;

use anyhow::{bail, Result};
use dialoguer::Confirm;

use super::{ConfigArgs, ConfigCommand};
use crate::config::{generate_default_config, CliConfig};
use crate::context::{Context, CONFIG_NAMES};

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Show => show_config(ctx).await,
        ConfigCommand::Get { key } => get_config(&key, ctx).await,
        ConfigCommand::Init {
            force,
            cache_version,
            origin,
        } => init_config(force, &cache_version, &origin, ctx).await,
        ConfigCommand::Validate => validate_config(ctx).await,
    }
}

async fn show_config(ctx: &Context) -> Result<()> {
    if ctx.output.is_json() {
        ctx.output.json(&ctx.config);
        return Ok(());
    }

    ctx.output.header("Current Configuration");
    match &ctx.source {
        Some(path) => ctx.output.kv("source", &path.display().to_string()),
        None => ctx.output.kv("source", "built-in defaults"),
    }

    let offline = &ctx.config.offline;
    ctx.output.blank();
    ctx.output.kv("cache_version", offline.cache_version.as_str());
    ctx.output.kv("origin", offline.origin.as_str());
    ctx.output.kv("skip_waiting", &offline.skip_waiting.to_string());
    ctx.output.kv("debug_headers", &offline.debug_headers.to_string());
    ctx.output.kv(
        "network_timeout_ms",
        &offline
            .network_timeout_ms
            .map(|ms| ms.to_string())
            .unwrap_or_else(|| "none".to_string()),
    );

    // Shell
    ctx.output.blank();
    ctx.output.info(&format!("shell ({} entries)", offline.shell.len()));
    for path in offline.shell.iter() {
        ctx.output.list_item(path);
    }

    // Fallbacks
    ctx.output.blank();
    ctx.output.info("navigation_fallbacks");
    for path in &offline.navigation_fallbacks {
        ctx.output.list_item(path);
    }

    // Static assets
    ctx.output.blank();
    ctx.output.info("[static_assets]");
    ctx.output.kv("prefixes", &offline.static_assets.prefixes.join(", "));
    ctx.output.kv("exact", &offline.static_assets.exact.join(", "));

    // Logging
    ctx.output.blank();
    ctx.output.info("[log]");
    ctx.output.kv("format", &ctx.config.log.format.to_string());
    ctx.output.kv("filter", &ctx.config.log.filter);

    Ok(())
}

async fn get_config(key: &str, ctx: &Context) -> Result<()> {
    let value = get_config_value(&ctx.config, key)?;

    if ctx.output.is_json() {
        ctx.output
            .json(&serde_json::json!({ "key": key, "value": value }));
    } else {
        println!("{}", value);
    }

    Ok(())
}

async fn init_config(force: bool, version: &str, origin: &str, ctx: &Context) -> Result<()> {
    let config_path = ctx.cwd.join(CONFIG_NAMES[0]);

    if config_path.exists() && !force {
        let overwrite = ctx.output.is_interactive()
            && Confirm::new()
                .with_prompt(format!("{} already exists. Overwrite?", config_path.display()))
                .default(false)
                .interact()?;

        if !overwrite {
            bail!(
                "Config file already exists: {}. Use --force to overwrite.",
                config_path.display()
            );
        }
    }

    let content = generate_default_config(version, origin);

    // Refuse to write a file the CLI could not load back.
    let parsed: CliConfig = toml::from_str(&content)?;
    parsed.offline.validate()?;

    fs::write(&config_path, content)?;

    ctx.output.success(&format!("Created: {}", config_path.display()));

    Ok(())
}

async fn validate_config(ctx: &Context) -> Result<()> {
    ctx.output.header("Validating configuration");

    let offline = &ctx.config.offline;
    let mut errors: Vec<String> = Vec::new();
    let mut warnings: Vec<String> = Vec::new();

    if let Err(e) = offline.validate() {
        errors.push(e.to_string());
    }

    if offline.shell.is_empty() {
        warnings.push("shell is empty; nothing will be available offline".to_string());
    }

    // Fallback pages only help offline if install cached them.
    for path in &offline.navigation_fallbacks {
        if !offline.shell.iter().any(|p| p == path.as_str()) {
            warnings.push(format!(
                "navigation fallback '{}' is not in the shell and may never be cached",
                path
            ));
        }
    }

    if offline.network_timeout_ms.is_some_and(|ms| ms < 100) {
        warnings.push("network_timeout_ms below 100 will fail most fetches".to_string());
    }

    // Print results
    if errors.is_empty() && warnings.is_empty() {
        ctx.output.success("Configuration is valid");
        return Ok(());
    }

    for error in &errors {
        ctx.output.error(&format!("Error: {}", error));
    }

    for warning in &warnings {
        ctx.output.warn(&format!("Warning: {}", warning));
    }

    if !errors.is_empty() {
        bail!("Configuration has {} error(s)", errors.len());
    }

    ctx.output.success("Configuration is valid (with warnings)");

    Ok(())
}

fn get_config_value(config: &CliConfig, key: &str) -> Result<serde_json::Value> {
    let value = serde_json::to_value(config)?;

    let mut current = &value;
    for part in key.split('.') {
        match current.get(part) {
            Some(next) => current = next,
            None => bail!("Unknown config key: {}", key),
        }
    }

    Ok(current.clone())
}
