//! Application services and the collaborator contracts they consume.

pub mod cache;
pub mod error;
pub mod flags;
pub mod notify;
pub mod pagination;
pub mod repos;
pub mod validation;
