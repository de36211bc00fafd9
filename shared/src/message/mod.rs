//! 变更消息类型定义
//!
//! 这些类型在 cafe-server 和 clients 之间共享。每次提交的写事务都会
//! 产生若干 [`ChangeRecord`]，它们带有全局递增的序列号，先写入持久化
//! 变更日志，再按序列号顺序广播到消息总线。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub mod payload;
pub use payload::*;

/// 数据集合 (同时作为订阅主题)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Bookings,
    Orders,
    Tables,
    Staff,
    Invites,
    Payments,
    Feedback,
    Notifications,
    Accounts,
    TableHistory,
}

impl Collection {
    pub const ALL: [Collection; 10] = [
        Collection::Bookings,
        Collection::Orders,
        Collection::Tables,
        Collection::Staff,
        Collection::Invites,
        Collection::Payments,
        Collection::Feedback,
        Collection::Notifications,
        Collection::Accounts,
        Collection::TableHistory,
    ];

    /// 存储表名 / 主题名
    pub fn as_str(self) -> &'static str {
        match self {
            Collection::Bookings => "bookings",
            Collection::Orders => "orders",
            Collection::Tables => "tables",
            Collection::Staff => "staff",
            Collection::Invites => "invites",
            Collection::Payments => "payments",
            Collection::Feedback => "feedback",
            Collection::Notifications => "notifications",
            Collection::Accounts => "accounts",
            Collection::TableHistory => "table_history",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 未知集合名
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown collection: {0}")]
pub struct UnknownCollection(pub String);

impl FromStr for Collection {
    type Err = UnknownCollection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Collection::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| UnknownCollection(s.to_string()))
    }
}

/// 变更类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeAction {
    Created,
    Updated,
    Deleted,
}

impl fmt::Display for ChangeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeAction::Created => write!(f, "created"),
            ChangeAction::Updated => write!(f, "updated"),
            ChangeAction::Deleted => write!(f, "deleted"),
        }
    }
}

/// 一次已提交的变更
///
/// `sequence` 在整个存储内全局唯一且无间隙递增，
/// 消费者可以用它检测丢失并从变更日志补齐。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeRecord {
    /// 全局序列号
    pub sequence: u64,
    /// 所属集合
    pub collection: Collection,
    /// 变更类型
    pub action: ChangeAction,
    /// 实体 ID
    pub id: String,
    /// 实体版本号 (删除时为删除前的版本)
    pub version: u64,
    /// 提交时间
    pub timestamp: DateTime<Utc>,
    /// 实体数据 (deleted 时为 None)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl ChangeRecord {
    /// 反序列化实体数据
    pub fn parse_data<T: serde::de::DeserializeOwned>(
        &self,
    ) -> Option<Result<T, serde_json::Error>> {
        self.data.clone().map(serde_json::from_value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_round_trips_through_name() {
        for c in Collection::ALL {
            assert_eq!(c.as_str().parse::<Collection>().unwrap(), c);
        }
        assert!("menu".parse::<Collection>().is_err());
    }

    #[test]
    fn test_change_record_serializes_without_data_when_deleted() {
        let record = ChangeRecord {
            sequence: 7,
            collection: Collection::TableHistory,
            action: ChangeAction::Deleted,
            id: "th-1".to_string(),
            version: 3,
            timestamp: Utc::now(),
            data: None,
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["collection"], "table_history");
        assert_eq!(json["action"], "deleted");
        assert!(json.get("data").is_none());
    }
}
