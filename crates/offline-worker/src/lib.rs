//! Offline cache manager worker.
//!
//! This crate ties the lifecycle together:
//! - `ShellPreloader` - Caches the shell on install, all or nothing
//! - `VersionReconciler` - Deletes stale stores and claims clients on activate
//! - `ClientRegistry` - Open client sessions and their controlling version
//! - `OfflineWorker` - Lifecycle facade routing fetch events to strategies
//!
//! ```ignore
//! use offline_worker::prelude::*;
//!
//! let config = OfflineConfig::load("offline.toml")?;
//! let worker = OfflineWorker::builder(config, network).build()?;
//!
//! worker.install().await?;
//! worker.activate().await?;
//! let response = worker.handle_fetch(&request).await?;
//! ```

mod activate;
mod clients;
mod install;
mod worker;

pub use activate::*;
pub use clients::*;
pub use install::*;
pub use worker::*;

pub use offline_cache;
pub use offline_core;
pub use offline_fetch;
pub use offline_observability;
pub use offline_router;
pub use offline_strategy;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{
        ClientRegistry, Clients, InstallError, InstallReport, OfflineWorker, ReconcileReport,
        ShellPreloader, VersionReconciler, WorkerError,
    };
    pub use offline_cache::*;
    pub use offline_core::*;
    pub use offline_fetch::*;
    pub use offline_observability::*;
    pub use offline_router::*;
    pub use offline_strategy::*;
}
