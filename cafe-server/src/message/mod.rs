//! 变更消息总线
//!
//! - [`MessageBus`] - 已提交变更的有序广播
//! - [`Subscription`] / [`SubscriptionHandle`] - 按主题订阅
//! - [`TopicFilter`] - 主题过滤

pub mod bus;
pub mod filter;

pub use bus::{BusConfig, BusError, MessageBus, Subscription, SubscriptionHandle};
pub use filter::TopicFilter;
pub use shared::message::{ChangeAction, ChangeRecord, Collection};
