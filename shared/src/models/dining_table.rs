//! Dining Table Model

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Cached table status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TableStatus {
    #[default]
    Free,
    Booked,
    Occupied,
}

/// Dining table entity (桌台)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiningTable {
    pub id: String,
    #[serde(default)]
    pub version: u64,
    /// Display number, e.g. "T5"
    pub table_number: String,
    pub capacity: u32,
    /// Free text such as "Window", "VIP Corner"
    pub position: String,
    pub location_id: String,
    pub location_name: String,
    pub status: TableStatus,
    pub current_booking_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DiningTable {
    pub fn is_free(&self) -> bool {
        self.status == TableStatus::Free
    }

    pub fn fits(&self, guests: u32) -> bool {
        self.capacity >= guests
    }
}

/// Create dining table payload
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DiningTableCreate {
    #[validate(length(min = 1, max = 16))]
    pub table_number: String,
    #[validate(range(min = 1, max = 50))]
    pub capacity: u32,
    #[serde(default)]
    #[validate(length(max = 64))]
    pub position: String,
    #[validate(length(min = 1))]
    pub location_id: String,
    #[validate(length(min = 1))]
    pub location_name: String,
}

/// Derived per-table view (not stored)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableAssignment {
    pub table_id: String,
    pub table_number: String,
    pub capacity: u32,
    pub status: TableStatus,
    pub booking_id: Option<String>,
    pub customer_name: Option<String>,
    pub guests: Option<u32>,
}

/// Suggested table for a pending booking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSuggestion {
    pub table_id: String,
    pub table_number: String,
    pub capacity: u32,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HistoryStatus {
    Ongoing,
    Completed,
    Cancelled,
    NoShow,
}

/// Table usage history entry (桌台使用记录)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableHistoryEntry {
    pub id: String,
    #[serde(default)]
    pub version: u64,
    pub table_id: String,
    pub table_number: String,
    pub booking_id: String,
    pub customer_id: String,
    pub customer_name: String,
    pub guests: u32,
    pub date: NaiveDate,
    pub time_slot: String,
    pub status: HistoryStatus,
    pub check_in_time: Option<DateTime<Utc>>,
    pub check_out_time: Option<DateTime<Utc>>,
    pub duration_minutes: Option<i64>,
    pub revenue: Option<f64>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Priority factors for one pending booking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorityFactors {
    pub vip_status: bool,
    pub loyalty_points: u32,
    pub booking_frequency: u32,
    pub party_size: u32,
    pub special_requests: bool,
    pub wait_time_minutes: i64,
}

/// Display-only ranking entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerPriority {
    pub customer_id: String,
    pub customer_name: String,
    pub booking_id: String,
    pub score: u32,
    pub factors: PriorityFactors,
}
