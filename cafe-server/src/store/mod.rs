//! 事务存储层
//!
//! - [`Store`] - redb 存储 (实体表 + 变更日志 + 全局序列号)
//! - [`StoreTxn`] - 跨集合写事务
//! - [`Record`] - 可存储实体 (id + version)

pub mod error;
pub mod record;
pub mod storage;

pub use error::{StoreError, StoreResult};
pub use record::Record;
pub use storage::{Store, StoreTxn};
