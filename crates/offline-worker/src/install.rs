//! Shell preloading on install.

use std::sync::Arc;

use futures::future::try_join_all;
use http::StatusCode;
use offline_cache::{CacheError, CacheStore, RequestKey};
use offline_core::{ConfigError, InterceptedRequest, OfflineConfig, Response};
use offline_fetch::{FetchError, Network};
use tracing::{debug, info, warn};
use url::Url;

/// Install failures. Any of them leaves the store without a shell.
#[derive(Debug, thiserror::Error)]
pub enum InstallError {
    #[error("Invalid shell configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to fetch shell entry {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: FetchError,
    },

    #[error("Shell entry {url} returned status {status}")]
    Status { url: String, status: StatusCode },

    #[error("Failed to store shell in {cache}: {source}")]
    Store {
        cache: String,
        #[source]
        source: CacheError,
    },
}

/// Outcome of a successful install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReport {
    /// Store that received the shell.
    pub cache: String,
    /// Number of entries written.
    pub entries: usize,
    /// Whether the host should activate without waiting for old clients to close.
    pub skip_waiting: bool,
}

/// Populates the current-version store with the shell.
pub struct ShellPreloader {
    network: Arc<dyn Network>,
    store: CacheStore,
    shell: Vec<Url>,
    skip_waiting: bool,
}

impl ShellPreloader {
    /// Create a preloader for an explicit list of shell URLs.
    pub fn new(network: Arc<dyn Network>, store: CacheStore, shell: Vec<Url>) -> Self {
        Self {
            network,
            store,
            shell,
            skip_waiting: true,
        }
    }

    /// Create a preloader from configuration.
    pub fn from_config(
        config: &OfflineConfig,
        network: Arc<dyn Network>,
        store: CacheStore,
    ) -> Result<Self, ConfigError> {
        Ok(Self::new(network, store, config.shell_urls()?).with_skip_waiting(config.skip_waiting))
    }

    /// Set whether the install report asks for immediate activation.
    pub fn with_skip_waiting(mut self, skip_waiting: bool) -> Self {
        self.skip_waiting = skip_waiting;
        self
    }

    /// Shell URLs in manifest order.
    pub fn shell(&self) -> &[Url] {
        &self.shell
    }

    /// Fetch every shell URL and commit them in one batch.
    ///
    /// Fetches run concurrently. A transport error or a non-2xx status on any
    /// entry fails the whole install and nothing is written.
    pub async fn preload(&self) -> Result<InstallReport, InstallError> {
        let cache = self.store.name().to_string();
        info!(cache = %cache, entries = self.shell.len(), "preloading shell");

        let entries = try_join_all(self.shell.iter().map(|url| self.fetch_entry(url))).await?;
        let count = entries.len();

        self.store
            .store_all(entries)
            .await
            .map_err(|source| InstallError::Store {
                cache: cache.clone(),
                source,
            })?;

        info!(cache = %cache, entries = count, "shell cached");
        Ok(InstallReport {
            cache,
            entries: count,
            skip_waiting: self.skip_waiting,
        })
    }

    async fn fetch_entry(&self, url: &Url) -> Result<(RequestKey, Response), InstallError> {
        let request = InterceptedRequest::get(url.clone());
        let response = self.network.fetch(&request).await.map_err(|source| {
            warn!(url = %url, error = %source, "shell entry unreachable");
            InstallError::Fetch {
                url: url.to_string(),
                source,
            }
        })?;

        if !response.is_ok() {
            warn!(url = %url, status = response.status.as_u16(), "shell entry rejected");
            return Err(InstallError::Status {
                url: url.to_string(),
                status: response.status,
            });
        }

        debug!(url = %url, bytes = response.body.len(), "shell entry fetched");
        Ok((RequestKey::for_request(&request), response))
    }
}

impl std::fmt::Debug for ShellPreloader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShellPreloader")
            .field("store", &self.store)
            .field("shell", &self.shell)
            .field("skip_waiting", &self.skip_waiting)
            .finish()
    }
}
