//! Customer feedback and ratings

pub mod service;

pub use service::FeedbackService;
