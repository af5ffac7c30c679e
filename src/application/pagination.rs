//! Offset pagination shared by repositories and transports.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_PAGE_LIMIT: u32 = 100;
pub const MAX_PAGE_LIMIT: u32 = 1000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaginationError {
    #[error("limit must be greater than zero")]
    ZeroLimit,
    #[error("limit must not exceed {max}")]
    LimitTooLarge { max: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OffsetPage {
    pub skip: u64,
    pub limit: u32,
}

impl OffsetPage {
    pub fn new(skip: u64, limit: u32) -> Result<Self, PaginationError> {
        if limit == 0 {
            return Err(PaginationError::ZeroLimit);
        }
        if limit > MAX_PAGE_LIMIT {
            return Err(PaginationError::LimitTooLarge {
                max: MAX_PAGE_LIMIT,
            });
        }
        Ok(Self { skip, limit })
    }
}

impl Default for OffsetPage {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}
