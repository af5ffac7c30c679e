//! In-process flag cache.
//!
//! Mirrors repository flags keyed by `namespace:code`, bounded by an LRU capacity
//! and an optional entry TTL. Configuration lives under `[cache]`:
//!
//! ```toml
//! [cache]
//! enabled = true
//! namespace = "feature-flag"
//! capacity = 1024
//! ttl_seconds = 0
//! ```

mod config;
mod keys;
mod lock;
mod store;

pub use config::{CacheConfig, DEFAULT_NAMESPACE};
pub use keys::NamespacedKey;
pub use store::{FlagStore, METRIC_CACHE_EVICT};
