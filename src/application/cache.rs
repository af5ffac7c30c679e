//! Cache contract consumed by the flag service.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::entities::FeatureFlag;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache backend unavailable: {0}")]
    Unavailable(String),
    #[error("cached value for `{key}` could not be encoded or decoded: {source}")]
    Codec {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

impl CacheError {
    pub fn unavailable(err: impl std::fmt::Display) -> Self {
        Self::Unavailable(err.to_string())
    }
}

/// Key-value mirror of repository flags, keyed by flag code.
///
/// Implementations prefix every key with their configured namespace so several
/// logical caches can share one backing store.
#[async_trait]
pub trait FlagCache: Send + Sync {
    async fn get(&self, code: &str) -> Result<Option<FeatureFlag>, CacheError>;

    /// Stores the full flag under its own `code`.
    async fn set(&self, flag: &FeatureFlag) -> Result<(), CacheError>;

    async fn delete(&self, code: &str) -> Result<(), CacheError>;

    /// Drops every entry in this cache's namespace.
    async fn clear(&self) -> Result<(), CacheError>;
}
