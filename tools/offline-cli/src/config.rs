//! CLI configuration.

use anyhow::{Context, Result};
use offline_core::OfflineConfig;
use offline_observability::{LogFormat, DEFAULT_LOG_FILTER};
use serde::{Deserialize, Serialize};
use url::Url;

/// Origin used when no config file is found.
pub const DEFAULT_ORIGIN: &str = "http://localhost:8080";

/// Cache version used when no config file is found.
pub const DEFAULT_CACHE_VERSION: &str = "thynkah-v3";

/// CLI configuration file: worker settings plus a `[log]` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CliConfig {
    /// Worker configuration.
    #[serde(flatten)]
    pub offline: OfflineConfig,

    /// Logging configuration.
    #[serde(default)]
    pub log: LogConfig,
}

impl CliConfig {
    /// Load and validate config from a file.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;

        let config: Self = if path.ends_with(".json") {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON config: {}", path))?
        } else {
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse TOML config: {}", path))?
        };

        config
            .offline
            .validate()
            .with_context(|| format!("Invalid config: {}", path))?;
        Ok(config)
    }

    /// Built-in config used when no file is present.
    pub fn builtin() -> Result<Self> {
        let origin = Url::parse(DEFAULT_ORIGIN).context("Invalid default origin")?;
        Ok(Self {
            offline: OfflineConfig::new(DEFAULT_CACHE_VERSION, origin),
            log: LogConfig::default(),
        })
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Output format (json or human).
    #[serde(default = "default_log_format")]
    pub format: LogFormat,

    /// Filter directive used when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

fn default_log_format() -> LogFormat {
    LogFormat::Human
}

fn default_log_filter() -> String {
    DEFAULT_LOG_FILTER.to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            format: default_log_format(),
            filter: default_log_filter(),
        }
    }
}

/// Generate a default offline.toml config file.
pub fn generate_default_config(version: &str, origin: &str) -> String {
    format!(
        r#"# Offline cache manager configuration

# Bump on every deploy that changes caching behavior or shell contents.
cache_version = "{version}"
origin = "{origin}"

# Resources cached at install time. Install fails if any is unreachable.
shell = [
    "/",
    "/browse",
    "/add",
    "/askui",
    "/css/style.css",
    "/manifest.json",
    "/icons/icon-192.png",
    "/icons/icon-512.png",
]

# Cached pages tried, in order, for offline navigations.
navigation_fallbacks = ["/browse", "/"]

skip_waiting = true
debug_headers = false
# network_timeout_ms = 3000

[static_assets]
prefixes = ["/css/", "/icons/"]
exact = ["/manifest.json"]

[log]
format = "human"
filter = "info"
"#,
        version = version,
        origin = origin
    )
}
