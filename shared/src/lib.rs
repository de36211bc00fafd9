//! Shared types for the cafe workspace
//!
//! Entities, status enums, request payloads and change records used by
//! cafe-server and its clients.

pub mod message;
pub mod models;

// Re-exports
pub use serde::{Deserialize, Serialize};

// Change feed re-exports (for convenient access)
pub use message::{ChangeAction, ChangeRecord, Collection};
