//! Data models
//!
//! Shared between cafe-server and its clients (via API).
//! Every stored entity carries `id: String` and `version: u64`;
//! the version is the optimistic-concurrency token checked on update.

pub mod account;
pub mod booking;
pub mod customer_session;
pub mod dining_table;
pub mod feedback;
pub mod invite;
pub mod notification;
pub mod order;
pub mod payment;
pub mod staff;

// Re-exports
pub use account::*;
pub use booking::*;
pub use customer_session::*;
pub use dining_table::*;
pub use feedback::*;
pub use invite::*;
pub use notification::*;
pub use order::*;
pub use payment::*;
pub use staff::*;
