//! Orders: lifecycle state machine, money arithmetic and the order service

pub mod machine;
pub mod money;
pub mod service;

pub use service::OrderService;
