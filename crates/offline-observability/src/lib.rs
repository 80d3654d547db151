//! Observability for the offline cache manager.
//!
//! This crate provides:
//! - `init_logging` / `LogFormat` - Global `tracing` subscriber setup
//! - `ResolutionMetrics` - Lock-free counters per strategy and response source
//! - `MetricsSnapshot` - Serializable point-in-time view of the counters

mod logging;
mod metrics;

pub use logging::*;
pub use metrics::*;
