//! Shared domain enumerations.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// State transition reported to notifiers after a successful mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeStatus {
    Created,
    Enabled,
    Disabled,
    Updated,
    Deleted,
}

impl ChangeStatus {
    pub const ALL: [ChangeStatus; 5] = [
        ChangeStatus::Created,
        ChangeStatus::Enabled,
        ChangeStatus::Disabled,
        ChangeStatus::Updated,
        ChangeStatus::Deleted,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ChangeStatus::Created => "created",
            ChangeStatus::Enabled => "enabled",
            ChangeStatus::Disabled => "disabled",
            ChangeStatus::Updated => "updated",
            ChangeStatus::Deleted => "deleted",
        }
    }

    /// The status produced by switching a flag to `enabled`.
    pub fn for_state(enabled: bool) -> Self {
        if enabled {
            ChangeStatus::Enabled
        } else {
            ChangeStatus::Disabled
        }
    }
}

impl fmt::Display for ChangeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown change status `{0}`")]
pub struct UnknownChangeStatus(pub String);

impl FromStr for ChangeStatus {
    type Err = UnknownChangeStatus;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        ChangeStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| UnknownChangeStatus(value.to_string()))
    }
}
