//! Cache storage for the offline cache manager.
//!
//! This crate provides:
//! - `CacheStorage` - Backend trait over named, versioned stores
//! - `MemoryCacheStorage` - In-process backend
//! - `CacheStore` - Accessor bound to the current `CacheVersion`
//! - `RequestKey` - Request identity used as the store key
//! - `CacheExplainHeaders` - Debug headers describing how a response was resolved
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use offline_cache::{CacheStore, MemoryCacheStorage, RequestKey};
//!
//! let storage = Arc::new(MemoryCacheStorage::new());
//! let store = CacheStore::new(storage, "thynkah-v3".into());
//!
//! store.store(RequestKey::get(&url), response).await?;
//! let cached = store.lookup(&RequestKey::get(&url)).await?;
//! ```

mod error;
mod headers;
mod key;
mod storage;
mod store;

pub use error::*;
pub use headers::*;
pub use key::*;
pub use storage::*;
pub use store::*;
