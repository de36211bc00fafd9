//! Payment transactions and refunds

pub mod service;

pub use service::PaymentService;
