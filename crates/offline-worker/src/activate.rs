//! Version reconciliation on activate.

use std::sync::Arc;

use offline_cache::{CacheError, CacheStorage};
use offline_core::CacheVersion;
use tracing::{info, warn};

use crate::clients::Clients;

/// Outcome of one reconciliation pass.
#[derive(Debug, Clone, Default)]
pub struct ReconcileReport {
    /// Stores deleted, in enumeration order.
    pub deleted: Vec<String>,
    /// Stores that could not be deleted, with the reason.
    pub failed: Vec<(String, CacheError)>,
    /// Sessions whose controller changed.
    pub claimed: usize,
}

impl ReconcileReport {
    /// Check if every stale store was removed.
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Deletes stores left by previous versions and claims open sessions.
pub struct VersionReconciler {
    storage: Arc<dyn CacheStorage>,
    version: CacheVersion,
    clients: Option<Arc<dyn Clients>>,
}

impl VersionReconciler {
    /// Create a reconciler keeping only `version`.
    pub fn new(storage: Arc<dyn CacheStorage>, version: CacheVersion) -> Self {
        Self {
            storage,
            version,
            clients: None,
        }
    }

    /// Claim these sessions after cleanup.
    pub fn with_clients(mut self, clients: Arc<dyn Clients>) -> Self {
        self.clients = Some(clients);
        self
    }

    /// Version that survives reconciliation.
    pub fn version(&self) -> &CacheVersion {
        &self.version
    }

    /// Delete every store not named after the current version, then claim clients.
    ///
    /// Deletion is best effort: a failure is recorded and the loop moves on.
    /// Only a failure to enumerate the stores is returned as an error.
    pub async fn reconcile(&self) -> Result<ReconcileReport, CacheError> {
        let mut report = ReconcileReport::default();

        for name in self.storage.keys().await? {
            if self.version.matches(&name) {
                continue;
            }

            match self.storage.delete(&name).await {
                Ok(_) => {
                    info!(cache = %name, current = %self.version, "stale cache deleted");
                    report.deleted.push(name);
                }
                Err(err) => {
                    warn!(cache = %name, error = %err, "failed to delete stale cache");
                    report.failed.push((name, err));
                }
            }
        }

        if let Some(clients) = &self.clients {
            report.claimed = clients.claim(&self.version).await;
        }

        Ok(report)
    }
}

impl std::fmt::Debug for VersionReconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VersionReconciler")
            .field("version", &self.version)
            .field("clients", &self.clients.is_some())
            .finish()
    }
}
