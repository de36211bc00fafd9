//! Per-account and admin inboxes
//!
//! Notifications are written by [`notify`] inside the same store
//! transaction as the state change that caused them.

pub mod relay;

pub use relay::{NotificationService, notify};
