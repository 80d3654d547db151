//! Cache manager configuration.
//!
//! Everything that used to be a module-level constant in a worker script
//! (cache name, shell list, fallback pages) is an explicit value here, so
//! several workers can run side by side with isolated namespaces.

use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

/// Shell resources cached at install time when no manifest is configured.
pub const DEFAULT_SHELL: &[&str] = &[
    "/",
    "/browse",
    "/add",
    "/askui",
    "/css/style.css",
    "/manifest.json",
    "/icons/icon-192.png",
    "/icons/icon-512.png",
];

/// Errors raised while loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse TOML config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Failed to parse JSON config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Cache version must not be empty")]
    EmptyVersion,

    #[error("Invalid path {path:?}: {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("Shell entry {0:?} is listed more than once")]
    DuplicateShellEntry(String),

    #[error("Network timeout must be greater than zero")]
    ZeroTimeout,
}

/// Identifier of the cache store owned by the current deployment.
///
/// Bumped on every deploy that changes caching behavior or shell contents.
/// Stores tagged with any other version are stale.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheVersion(String);

impl CacheVersion {
    /// Create a cache version from a store name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Get the version string (also the store name).
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check whether a store name belongs to this version.
    pub fn matches(&self, store_name: &str) -> bool {
        self.0 == store_name
    }
}

impl std::fmt::Display for CacheVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for CacheVersion {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for CacheVersion {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Ordered list of paths that must be available offline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShellManifest(Vec<String>);

impl ShellManifest {
    /// Create a manifest from a list of paths.
    pub fn new<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(paths.into_iter().map(Into::into).collect())
    }

    /// Get the paths in declaration order.
    pub fn paths(&self) -> &[String] {
        &self.0
    }

    /// Number of shell entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if the manifest is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over the paths.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl Default for ShellManifest {
    fn default() -> Self {
        Self::new(DEFAULT_SHELL.iter().copied())
    }
}

/// Path predicate for static assets served cache-first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticAssetRules {
    /// Path prefixes (e.g. `/css/`).
    #[serde(default = "default_asset_prefixes")]
    pub prefixes: Vec<String>,
    /// Exact paths (e.g. `/manifest.json`).
    #[serde(default = "default_asset_exact")]
    pub exact: Vec<String>,
}

fn default_asset_prefixes() -> Vec<String> {
    vec!["/css/".to_string(), "/icons/".to_string()]
}

fn default_asset_exact() -> Vec<String> {
    vec!["/manifest.json".to_string()]
}

impl Default for StaticAssetRules {
    fn default() -> Self {
        Self {
            prefixes: default_asset_prefixes(),
            exact: default_asset_exact(),
        }
    }
}

impl StaticAssetRules {
    /// Rules matching nothing.
    pub fn none() -> Self {
        Self {
            prefixes: Vec::new(),
            exact: Vec::new(),
        }
    }

    /// Add a path prefix.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefixes.push(prefix.into());
        self
    }

    /// Add an exact path.
    pub fn with_exact(mut self, path: impl Into<String>) -> Self {
        self.exact.push(path.into());
        self
    }

    /// Check if a URL path is a static asset.
    pub fn matches(&self, path: &str) -> bool {
        self.exact.iter().any(|p| p == path)
            || self.prefixes.iter().any(|p| path.starts_with(p.as_str()))
    }
}

fn default_navigation_fallbacks() -> Vec<String> {
    vec!["/browse".to_string(), "/".to_string()]
}

fn default_skip_waiting() -> bool {
    true
}

/// Configuration injected into the preloader, reconciler and resolvers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfflineConfig {
    /// Current cache version; also the name of the current store.
    pub cache_version: CacheVersion,
    /// Origin the shell and fallback paths are resolved against.
    pub origin: Url,
    /// Resources cached at install time.
    #[serde(default)]
    pub shell: ShellManifest,
    /// Cached pages tried, in order, when an offline navigation misses.
    #[serde(default = "default_navigation_fallbacks")]
    pub navigation_fallbacks: Vec<String>,
    /// Whether the worker should activate as soon as it is installed.
    #[serde(default = "default_skip_waiting")]
    pub skip_waiting: bool,
    /// Fetches slower than this count as network failures.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_timeout_ms: Option<u64>,
    /// Attach `X-Offline-*` explain headers to resolved responses.
    #[serde(default)]
    pub debug_headers: bool,
    /// Static asset predicate for the cache-first strategy.
    #[serde(default)]
    pub static_assets: StaticAssetRules,
}

impl OfflineConfig {
    /// Create a configuration with default shell, assets and fallbacks.
    pub fn new(cache_version: impl Into<CacheVersion>, origin: Url) -> Self {
        Self {
            cache_version: cache_version.into(),
            origin,
            shell: ShellManifest::default(),
            navigation_fallbacks: default_navigation_fallbacks(),
            skip_waiting: default_skip_waiting(),
            network_timeout_ms: None,
            debug_headers: false,
            static_assets: StaticAssetRules::default(),
        }
    }

    /// Set the shell manifest.
    pub fn with_shell(mut self, shell: ShellManifest) -> Self {
        self.shell = shell;
        self
    }

    /// Set the static asset rules.
    pub fn with_static_assets(mut self, rules: StaticAssetRules) -> Self {
        self.static_assets = rules;
        self
    }

    /// Set the navigation fallback chain.
    pub fn with_navigation_fallbacks<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.navigation_fallbacks = paths.into_iter().map(Into::into).collect();
        self
    }

    /// Set the network timeout.
    pub fn with_network_timeout(mut self, timeout: Duration) -> Self {
        self.network_timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    /// Enable or disable explain headers.
    pub fn with_debug_headers(mut self, enabled: bool) -> Self {
        self.debug_headers = enabled;
        self
    }

    /// Enable or disable skip-waiting.
    pub fn with_skip_waiting(mut self, enabled: bool) -> Self {
        self.skip_waiting = enabled;
        self
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a JSON document.
    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load config from a file (JSON if the extension is `.json`, TOML otherwise).
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;

        if path.extension().is_some_and(|ext| ext == "json") {
            Self::from_json_str(&content)
        } else {
            Self::from_toml_str(&content)
        }
    }

    /// Check the configuration for values the worker cannot operate with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache_version.as_str().trim().is_empty() {
            return Err(ConfigError::EmptyVersion);
        }

        if self.network_timeout_ms == Some(0) {
            return Err(ConfigError::ZeroTimeout);
        }

        let mut seen = HashSet::new();
        for path in self.shell.iter() {
            self.resolve(path)?;
            if !seen.insert(path) {
                return Err(ConfigError::DuplicateShellEntry(path.to_string()));
            }
        }

        for path in &self.navigation_fallbacks {
            self.resolve(path)?;
        }

        Ok(())
    }

    /// Resolve an absolute path against the configured origin.
    pub fn resolve(&self, path: &str) -> Result<Url, ConfigError> {
        if !path.starts_with('/') {
            return Err(ConfigError::InvalidPath {
                path: path.to_string(),
                reason: "must start with '/'".to_string(),
            });
        }

        let url = self.origin.join(path).map_err(|e| ConfigError::InvalidPath {
            path: path.to_string(),
            reason: e.to_string(),
        })?;

        // A protocol-relative path ("//host/x") joins onto another host.
        if url.origin() != self.origin.origin() {
            return Err(ConfigError::InvalidPath {
                path: path.to_string(),
                reason: format!("leaves origin {}", self.origin.origin().ascii_serialization()),
            });
        }

        Ok(url)
    }

    /// Shell manifest resolved to absolute URLs, in declaration order.
    pub fn shell_urls(&self) -> Result<Vec<Url>, ConfigError> {
        self.shell.iter().map(|p| self.resolve(p)).collect()
    }

    /// Navigation fallbacks resolved to absolute URLs, in order.
    pub fn fallback_urls(&self) -> Result<Vec<Url>, ConfigError> {
        self.navigation_fallbacks
            .iter()
            .map(|p| self.resolve(p))
            .collect()
    }

    /// Network timeout, if configured.
    pub fn network_timeout(&self) -> Option<Duration> {
        self.network_timeout_ms.map(Duration::from_millis)
    }
}
