//! Core abstractions for the offline cache manager.
//!
//! This crate provides the fundamental types shared by every other crate:
//! - `OfflineConfig` - Cache version, shell manifest and routing configuration
//! - `InterceptedRequest` - A request handed over by the host for resolution
//! - `Response` - Response snapshot returned to the host or kept in a store
//! - `WorkerState` - Install/activate lifecycle tracking

mod config;
mod context;
mod lifecycle;
mod response;

pub use config::*;
pub use context::*;
pub use lifecycle::*;
pub use response::*;
