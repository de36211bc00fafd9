//! Staff Model (厨师 / 服务员)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StaffRole {
    Chef,
    Waiter,
}

impl StaffRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Chef => "CHEF",
            Self::Waiter => "WAITER",
        }
    }
}

impl fmt::Display for StaffRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StaffStatus {
    #[default]
    Available,
    Unavailable,
}

/// Staff member
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaffMember {
    /// Staff id (same as the backing account id)
    pub id: String,
    #[serde(default)]
    pub version: u64,
    pub name: String,
    pub email: String,
    pub role: StaffRole,
    pub status: StaffStatus,
    /// Derived: orders this member holds in PENDING / ACCEPTED / PREPARING
    pub assigned_orders_count: u32,
    pub invite_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StaffMember {
    pub fn is_available(&self) -> bool {
        self.status == StaffStatus::Available
    }
}

/// Toggle payload
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct StaffStatusUpdate {
    pub status: StaffStatus,
}

/// Result of a status toggle: the member plus orders put back in the queue
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaffStatusChange {
    pub staff: StaffMember,
    pub affected_orders: Vec<super::order::Order>,
}
