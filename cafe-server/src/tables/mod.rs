//! Dining tables: cached status, usage history and the display-only
//! priority queue

pub mod history;
pub mod priority;
pub mod service;

pub use service::{TableService, refresh_table_status};
