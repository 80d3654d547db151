//! Network access for the offline cache manager.
//!
//! This crate provides:
//! - `Network` - The seam every strategy fetches through
//! - `FetchError` - Transport-level failures
//! - `TimeoutNetwork` - Turns slow fetches into failures
//! - `StaticNetwork` - In-memory network for development and tests

mod network;
mod static_network;
mod timeout;

pub use network::*;
pub use static_network::*;
pub use timeout::*;
