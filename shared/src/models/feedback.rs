//! Customer Feedback Model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeedbackKind {
    Order,
    Service,
    Ambiance,
    Overall,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeedbackStatus {
    #[default]
    Pending,
    Published,
    Hidden,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feedback {
    pub id: String,
    #[serde(default)]
    pub version: u64,
    pub customer_id: String,
    pub customer_name: String,
    pub order_id: Option<String>,
    pub booking_id: Option<String>,
    pub kind: FeedbackKind,
    pub food_quality: Option<u8>,
    pub service_quality: Option<u8>,
    pub ambiance: Option<u8>,
    pub value_for_money: Option<u8>,
    pub overall_rating: u8,
    pub comment: String,
    pub status: FeedbackStatus,
    pub admin_response: Option<String>,
    pub responded_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct FeedbackCreate {
    pub order_id: Option<String>,
    pub booking_id: Option<String>,
    pub kind: FeedbackKind,
    #[validate(range(min = 1, max = 5))]
    pub food_quality: Option<u8>,
    #[validate(range(min = 1, max = 5))]
    pub service_quality: Option<u8>,
    #[validate(range(min = 1, max = 5))]
    pub ambiance: Option<u8>,
    #[validate(range(min = 1, max = 5))]
    pub value_for_money: Option<u8>,
    #[validate(range(min = 1, max = 5))]
    pub overall_rating: u8,
    #[serde(default)]
    #[validate(length(max = 2000))]
    pub comment: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct FeedbackRespond {
    #[validate(length(min = 1, max = 2000))]
    pub response: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct FeedbackStatusUpdate {
    pub status: FeedbackStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedbackStats {
    pub total: u32,
    pub average_rating: f64,
    /// rating (1..=5) → count
    pub rating_distribution: BTreeMap<u8, u32>,
    pub by_kind: BTreeMap<FeedbackKind, u32>,
    pub pending: u32,
    pub responded: u32,
}
