use serde::{Deserialize, Serialize};

use crate::application::pagination::DEFAULT_PAGE_LIMIT;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub skip: u64,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_limit() -> u32 {
    DEFAULT_PAGE_LIMIT
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub status: &'static str,
}

impl DeleteResponse {
    pub fn deleted() -> Self {
        Self { status: "deleted" }
    }
}
