//! Request classification for the offline cache manager.
//!
//! Every intercepted request is matched against an ordered rule list; the
//! first matching rule picks the `Strategy`. The last rule always matches,
//! so no request is left unclassified.
//!
//! ```ignore
//! use offline_router::{Router, Strategy};
//!
//! let router = Router::from_config(&config);
//! assert_eq!(router.classify(&request), Strategy::CacheFirstRevalidate);
//! ```

mod rule;
mod strategy;

pub use rule::*;
pub use strategy::*;
