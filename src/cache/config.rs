//! Cache configuration.

use std::{num::NonZeroUsize, time::Duration};

use serde::Deserialize;

pub const DEFAULT_NAMESPACE: &str = "feature-flag";
const DEFAULT_CAPACITY: usize = 1024;
const DEFAULT_TTL_SECONDS: u64 = 0;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// When false the flag service runs without a cache.
    pub enabled: bool,
    /// Prefix applied to every key, separated by `:`.
    pub namespace: String,
    /// Maximum cached flags before least-recently-used eviction.
    pub capacity: usize,
    /// Entry lifetime in seconds; zero keeps entries until evicted or replaced.
    pub ttl_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            namespace: DEFAULT_NAMESPACE.to_string(),
            capacity: DEFAULT_CAPACITY,
            ttl_seconds: DEFAULT_TTL_SECONDS,
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            enabled: settings.enabled,
            namespace: settings.namespace.clone(),
            capacity: settings.capacity.get(),
            ttl_seconds: settings.ttl_seconds,
        }
    }
}

impl CacheConfig {
    /// Returns the capacity as NonZeroUsize, clamping to 1 if zero.
    pub fn capacity_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.capacity).unwrap_or(NonZeroUsize::MIN)
    }

    pub fn ttl(&self) -> Option<Duration> {
        (self.ttl_seconds > 0).then(|| Duration::from_secs(self.ttl_seconds))
    }
}
