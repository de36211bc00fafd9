//! Live customer sessions, derived from accounts, bookings and orders

pub mod service;

pub use service::{CustomerSessionService, derive_session};
