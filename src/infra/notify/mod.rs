//! Notification adapters.

mod slack;

pub use slack::SlackNotifier;
