//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::application::pagination::OffsetPage;
use crate::domain::entities::{FeatureFlag, NewFeatureFlag};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// Read side of flag persistence. Lookups that match nothing return `Ok(None)`.
#[async_trait]
pub trait FlagsRepo: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<FeatureFlag>, RepoError>;

    async fn find_by_code(&self, code: &str) -> Result<Option<FeatureFlag>, RepoError>;

    /// Returns at most `page.limit` flags after skipping `page.skip`, in a stable order.
    async fn list(&self, page: OffsetPage) -> Result<Vec<FeatureFlag>, RepoError>;
}

/// Write side of flag persistence. `update` and `delete` report `RepoError::NotFound`
/// when no row matches the id.
#[async_trait]
pub trait FlagsWriteRepo: Send + Sync {
    async fn insert(&self, flag: NewFeatureFlag) -> Result<Uuid, RepoError>;

    async fn update(&self, flag: &FeatureFlag) -> Result<(), RepoError>;

    async fn delete(&self, id: Uuid) -> Result<(), RepoError>;
}
