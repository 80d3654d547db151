//! Caching strategies and request resolution.
//!
//! This crate provides:
//! - `Resolver` - Classifies a request and runs the matching strategy
//! - `StrategyContext` - Network, current store and fallback pages shared by strategies
//! - `BackgroundWriter` - Detached cache writes with an observable completion hook
//! - `Resolution` / `ResolveError` - Exactly one outcome per request

mod background;
mod cache_first;
mod context;
mod error;
mod network_first;
mod network_only;
mod resolver;

#[cfg(test)]
mod test_support;

pub use background::*;
pub use context::*;
pub use error::*;
pub use resolver::*;

pub mod strategies {
    //! Individual strategy implementations, callable without the router.
    pub use crate::cache_first::resolve as cache_first_revalidate;
    pub use crate::network_first::resolve as network_first;
    pub use crate::network_first::resolve_navigation as network_first_navigation;
    pub use crate::network_only::resolve as network_only_with_stub;
}
