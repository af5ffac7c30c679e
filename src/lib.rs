//! Feature flag service with a cache-aside consistency layer.
//!
//! [`application::flags::FeatureFlagService`] is the orchestration point: every
//! mutation runs validation, commits to the repository, refreshes the cache and then
//! notifies; every read tries the cache before the repository.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
