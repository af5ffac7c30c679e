//! LRU-backed flag cache.
//!
//! Values are stored as the JSON encoding of the whole flag so a cache hit decodes to
//! exactly the entity that was written. Several namespaces may share one backing LRU.

use std::{
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use async_trait::async_trait;
use lru::LruCache;
use metrics::counter;
use tracing::debug;

use crate::application::cache::{CacheError, FlagCache};
use crate::domain::entities::FeatureFlag;

use super::config::CacheConfig;
use super::keys::NamespacedKey;
use super::lock::mutex_lock;

const SOURCE: &str = "cache::store";

pub const METRIC_CACHE_EVICT: &str = "flagforge_cache_evict_total";

#[derive(Clone)]
struct CachedEntry {
    payload: String,
    stored_at: Instant,
}

type Backing = Arc<Mutex<LruCache<NamespacedKey, CachedEntry>>>;

pub struct FlagStore {
    namespace: String,
    ttl: Option<Duration>,
    entries: Backing,
}

impl FlagStore {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            namespace: config.namespace.clone(),
            ttl: config.ttl(),
            entries: Arc::new(Mutex::new(LruCache::new(config.capacity_non_zero()))),
        }
    }

    /// A second logical cache over the same backing LRU, isolated by `namespace`.
    pub fn with_namespace(&self, namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            ttl: self.ttl,
            entries: Arc::clone(&self.entries),
        }
    }

    pub fn with_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Number of entries in the backing LRU across all namespaces.
    pub fn len(&self) -> usize {
        mutex_lock(&self.entries, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn key(&self, code: &str) -> NamespacedKey {
        NamespacedKey::new(&self.namespace, code)
    }

    fn is_expired(&self, entry: &CachedEntry) -> bool {
        self.ttl
            .is_some_and(|ttl| entry.stored_at.elapsed() >= ttl)
    }
}

#[async_trait]
impl FlagCache for FlagStore {
    async fn get(&self, code: &str) -> Result<Option<FeatureFlag>, CacheError> {
        let key = self.key(code);
        let mut entries = mutex_lock(&self.entries, SOURCE, "get");
        match entries.get(&key) {
            None => return Ok(None),
            Some(entry) if !self.is_expired(entry) => {
                return decode(&key, &entry.payload).map(Some);
            }
            Some(_) => {}
        }

        entries.pop(&key);
        drop(entries);
        debug!(target = SOURCE, key = %key, "cache entry expired");
        Ok(None)
    }

    async fn set(&self, flag: &FeatureFlag) -> Result<(), CacheError> {
        let key = self.key(&flag.code);
        let payload = serde_json::to_string(flag).map_err(|source| CacheError::Codec {
            key: key.to_string(),
            source,
        })?;
        let entry = CachedEntry {
            payload,
            stored_at: Instant::now(),
        };

        let evicted = mutex_lock(&self.entries, SOURCE, "set").push(key.clone(), entry);
        if let Some((evicted_key, _)) = evicted {
            if evicted_key != key {
                counter!(METRIC_CACHE_EVICT).increment(1);
                debug!(target = SOURCE, key = %evicted_key, "cache entry evicted for capacity");
            }
        }
        Ok(())
    }

    async fn delete(&self, code: &str) -> Result<(), CacheError> {
        let key = self.key(code);
        mutex_lock(&self.entries, SOURCE, "delete").pop(&key);
        Ok(())
    }

    async fn clear(&self) -> Result<(), CacheError> {
        let mut entries = mutex_lock(&self.entries, SOURCE, "clear");
        let owned: Vec<NamespacedKey> = entries
            .iter()
            .map(|(key, _)| key)
            .filter(|key| key.in_namespace(&self.namespace))
            .cloned()
            .collect();
        for key in owned {
            entries.pop(&key);
        }
        Ok(())
    }
}

fn decode(key: &NamespacedKey, payload: &str) -> Result<FeatureFlag, CacheError> {
    serde_json::from_str(payload).map_err(|source| CacheError::Codec {
        key: key.to_string(),
        source,
    })
}
