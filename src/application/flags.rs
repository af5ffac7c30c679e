//! Cache-aside orchestration for feature flags.
//!
//! The repository is the only source of truth and the only write target. The cache
//! mirrors repository state keyed by flag code: reads try it first and fall back to
//! the repository on a miss or a cache failure; mutations write the repository first
//! and then refresh the cache. Notifiers hear about committed transitions on a
//! detached task and can never change the outcome of a mutation.

use std::sync::Arc;

use metrics::counter;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::application::cache::{CacheError, FlagCache};
use crate::application::notify::Notifier;
use crate::application::pagination::OffsetPage;
use crate::application::repos::{FlagsRepo, FlagsWriteRepo, RepoError};
use crate::application::validation::{self, FlagPatch, ValidationError};
use crate::domain::entities::FeatureFlag;
use crate::domain::types::ChangeStatus;

const SOURCE: &str = "application::flags";

pub const METRIC_CACHE_HIT: &str = "flagforge_cache_hit_total";
pub const METRIC_CACHE_MISS: &str = "flagforge_cache_miss_total";
pub const METRIC_CACHE_ERROR: &str = "flagforge_cache_error_total";

#[derive(Debug, Error)]
pub enum FlagError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),
    #[error("feature flag with code `{code}` not found")]
    NotFound { code: String },
    #[error("failed to refresh cache for feature flag `{code}`")]
    Cache {
        code: String,
        #[source]
        source: CacheError,
    },
    #[error("failed to {operation} feature flag")]
    Storage {
        operation: &'static str,
        #[source]
        source: RepoError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagErrorKind {
    Validation,
    NotFound,
    Cache,
    Storage,
}

impl FlagError {
    pub fn kind(&self) -> FlagErrorKind {
        match self {
            FlagError::Validation(_) => FlagErrorKind::Validation,
            FlagError::NotFound { .. } => FlagErrorKind::NotFound,
            FlagError::Cache { .. } => FlagErrorKind::Cache,
            FlagError::Storage { .. } => FlagErrorKind::Storage,
        }
    }

    fn not_found(code: &str) -> Self {
        Self::NotFound {
            code: code.to_string(),
        }
    }

    fn storage(operation: &'static str) -> impl FnOnce(RepoError) -> Self {
        move |source| Self::Storage { operation, source }
    }
}

#[derive(Clone)]
pub struct FeatureFlagService {
    reader: Arc<dyn FlagsRepo>,
    writer: Arc<dyn FlagsWriteRepo>,
    cache: Option<Arc<dyn FlagCache>>,
    notifier: Option<Arc<dyn Notifier>>,
}

impl FeatureFlagService {
    pub fn new(reader: Arc<dyn FlagsRepo>, writer: Arc<dyn FlagsWriteRepo>) -> Self {
        Self {
            reader,
            writer,
            cache: None,
            notifier: None,
        }
    }

    pub fn with_cache(mut self, cache: Arc<dyn FlagCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn has_cache(&self) -> bool {
        self.cache.is_some()
    }

    pub async fn create(&self, payload: &Value) -> Result<FeatureFlag, FlagError> {
        let new_flag = validation::validate_create(payload).inspect_err(|err| {
            warn!(target = SOURCE, error = %err, "rejected feature flag creation payload");
        })?;
        let code = new_flag.code.clone();

        let id = self
            .writer
            .insert(new_flag)
            .await
            .map_err(FlagError::storage("create"))
            .inspect_err(|err| log_storage_failure(err, &code))?;

        // Re-read so the caller sees exactly what storage persisted.
        let flag = self
            .reader
            .find_by_id(id)
            .await
            .and_then(|found| found.ok_or(RepoError::NotFound))
            .map_err(FlagError::storage("create"))
            .inspect_err(|err| log_storage_failure(err, &code))?;

        self.finish_mutation(flag, ChangeStatus::Created).await
    }

    pub async fn get_by_code(&self, code: &str) -> Result<FeatureFlag, FlagError> {
        if let Some(cache) = &self.cache {
            match cache.get(code).await {
                Ok(Some(flag)) => {
                    counter!(METRIC_CACHE_HIT).increment(1);
                    debug!(target = SOURCE, code, "feature flag served from cache");
                    return Ok(flag);
                }
                Ok(None) => {
                    counter!(METRIC_CACHE_MISS).increment(1);
                }
                Err(err) => {
                    counter!(METRIC_CACHE_ERROR, "op" => "get").increment(1);
                    warn!(
                        target = SOURCE,
                        code,
                        error = %err,
                        "cache read failed, falling back to repository"
                    );
                }
            }
        }

        let flag = self.find_authoritative(code, "fetch").await?;

        if let Some(cache) = &self.cache {
            if let Err(err) = cache.set(&flag).await {
                counter!(METRIC_CACHE_ERROR, "op" => "set").increment(1);
                warn!(
                    target = SOURCE,
                    code,
                    error = %err,
                    "cache repopulation after read failed"
                );
            }
        }

        Ok(flag)
    }

    /// Lists flags straight from the repository; the cache only holds single codes.
    pub async fn list(&self, page: OffsetPage) -> Result<Vec<FeatureFlag>, FlagError> {
        self.reader.list(page).await.map_err(|source| {
            error!(
                target = SOURCE,
                error = %source,
                skip = page.skip,
                limit = page.limit,
                "failed to list feature flags"
            );
            FlagError::Storage {
                operation: "list",
                source,
            }
        })
    }

    pub async fn update(&self, code: &str, payload: &Value) -> Result<FeatureFlag, FlagError> {
        let patch = validation::validate_update(payload).inspect_err(|err| {
            warn!(target = SOURCE, code, error = %err, "rejected feature flag update payload");
        })?;
        self.apply_patch(code, &patch, "update", ChangeStatus::Updated)
            .await
    }

    pub async fn enable(&self, code: &str) -> Result<FeatureFlag, FlagError> {
        self.set_state(code, true).await
    }

    pub async fn disable(&self, code: &str) -> Result<FeatureFlag, FlagError> {
        self.set_state(code, false).await
    }

    pub async fn delete(&self, code: &str) -> Result<(), FlagError> {
        let flag = self.find_authoritative(code, "delete").await?;

        self.writer
            .delete(flag.id)
            .await
            .map_err(|source| match source {
                RepoError::NotFound => FlagError::not_found(code),
                source => FlagError::Storage {
                    operation: "delete",
                    source,
                },
            })
            .inspect_err(|err| log_storage_failure(err, code))?;

        self.evict(code).await;
        self.notify(&flag, ChangeStatus::Deleted);
        Ok(())
    }

    /// Always writes, even when the flag is already in the requested state.
    async fn set_state(&self, code: &str, enabled: bool) -> Result<FeatureFlag, FlagError> {
        let operation = if enabled { "enable" } else { "disable" };
        self.apply_patch(
            code,
            &FlagPatch::enabled(enabled),
            operation,
            ChangeStatus::for_state(enabled),
        )
        .await
    }

    async fn apply_patch(
        &self,
        code: &str,
        patch: &FlagPatch,
        operation: &'static str,
        status: ChangeStatus,
    ) -> Result<FeatureFlag, FlagError> {
        // Mutations read the repository, never the cache, so a stale mirror cannot
        // resurrect old field values.
        let mut flag = self.find_authoritative(code, operation).await?;
        patch.apply_to(&mut flag);

        self.writer
            .update(&flag)
            .await
            .map_err(|source| match source {
                RepoError::NotFound => FlagError::not_found(code),
                source => FlagError::Storage { operation, source },
            })
            .inspect_err(|err| log_storage_failure(err, code))?;

        if flag.code != code {
            self.evict(code).await;
        }

        self.finish_mutation(flag, status).await
    }

    async fn find_authoritative(
        &self,
        code: &str,
        operation: &'static str,
    ) -> Result<FeatureFlag, FlagError> {
        let found = self
            .reader
            .find_by_code(code)
            .await
            .map_err(FlagError::storage(operation))
            .inspect_err(|err| log_storage_failure(err, code))?;

        found.ok_or_else(|| {
            warn!(target = SOURCE, code, operation, "feature flag not found");
            FlagError::not_found(code)
        })
    }

    /// Refreshes the cache and notifies. The repository write has already committed,
    /// so the notification goes out even when the refresh fails.
    async fn finish_mutation(
        &self,
        flag: FeatureFlag,
        status: ChangeStatus,
    ) -> Result<FeatureFlag, FlagError> {
        let refreshed = self.refresh_cache(&flag).await;
        self.notify(&flag, status);
        refreshed.map(|()| flag)
    }

    async fn refresh_cache(&self, flag: &FeatureFlag) -> Result<(), FlagError> {
        let Some(cache) = &self.cache else {
            return Ok(());
        };

        cache.set(flag).await.map_err(|source| {
            counter!(METRIC_CACHE_ERROR, "op" => "set").increment(1);
            error!(
                target = SOURCE,
                code = %flag.code,
                error = %source,
                "cache refresh failed after committed write"
            );
            FlagError::Cache {
                code: flag.code.clone(),
                source,
            }
        })
    }

    async fn evict(&self, code: &str) {
        let Some(cache) = &self.cache else {
            return;
        };

        if let Err(err) = cache.delete(code).await {
            counter!(METRIC_CACHE_ERROR, "op" => "delete").increment(1);
            warn!(
                target = SOURCE,
                code,
                error = %err,
                "cache eviction failed; entry may be served until it is replaced"
            );
        }
    }

    fn notify(&self, flag: &FeatureFlag, status: ChangeStatus) {
        let Some(notifier) = self.notifier.clone() else {
            return;
        };

        let flag = flag.clone();
        tokio::spawn(async move {
            if let Err(err) = notifier.send(&flag, status).await {
                warn!(
                    target = SOURCE,
                    code = %flag.code,
                    status = %status,
                    error = %err,
                    "feature flag notification failed"
                );
            }
        });
    }
}

fn log_storage_failure(err: &FlagError, code: &str) {
    if let FlagError::Storage { operation, source } = err {
        error!(
            target = SOURCE,
            code,
            operation,
            error = %source,
            "feature flag storage operation failed"
        );
    }
}
