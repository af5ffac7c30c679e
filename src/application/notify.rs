//! Notification contract for flag state transitions.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::entities::FeatureFlag;
use crate::domain::types::ChangeStatus;

#[derive(Debug, Error)]
pub enum NotifierError {
    #[error("notification transport failed: {0}")]
    Transport(String),
    #[error("notification rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

impl NotifierError {
    pub fn transport(err: impl std::fmt::Display) -> Self {
        Self::Transport(err.to_string())
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, flag: &FeatureFlag, status: ChangeStatus) -> Result<(), NotifierError>;
}

/// Decides which change statuses a notifier delivers.
///
/// An empty `included` list admits every status; `excluded` always wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusFilter {
    pub included: Vec<ChangeStatus>,
    pub excluded: Vec<ChangeStatus>,
}

impl StatusFilter {
    pub fn allows(&self, status: ChangeStatus) -> bool {
        let included = self.included.is_empty() || self.included.contains(&status);
        included && !self.excluded.contains(&status)
    }
}
