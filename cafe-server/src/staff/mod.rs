//! Staff: availability, explicit order assignment and invites

pub mod invites;
pub mod service;

pub use invites::InviteService;
pub use service::{StaffService, recalculate_counts};
