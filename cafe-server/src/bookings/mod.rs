//! Table bookings: lifecycle state machine and service

pub mod machine;
pub mod service;

pub use service::BookingService;
