//! Domain entities mirrored from persistent storage.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A named boolean toggle, looked up by its unique `code`.
///
/// The `id` is assigned by the repository on insert and never changes afterwards.
/// Cached copies are full encodings of this struct, so a flag read from the cache
/// compares equal to the one it mirrors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureFlag {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub enabled: bool,
}

/// A flag that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFeatureFlag {
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub enabled: bool,
}

impl NewFeatureFlag {
    pub fn into_flag(self, id: Uuid) -> FeatureFlag {
        FeatureFlag {
            id,
            code: self.code,
            name: self.name,
            description: self.description,
            enabled: self.enabled,
        }
    }
}
