//! Payment Transaction Model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    Paid,
    PendingRefund,
    Refunded,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentTransaction {
    pub id: String,
    #[serde(default)]
    pub version: u64,
    /// Human facing reference, e.g. "TXN-1A2B3C4D"
    pub transaction_id: String,
    pub customer_id: String,
    pub customer_name: String,
    pub booking_id: Option<String>,
    pub order_id: Option<String>,
    pub amount: f64,
    pub payment_mode: String,
    pub status: TransactionStatus,
    pub refund_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub refund_requested_at: Option<DateTime<Utc>>,
    pub refunded_at: Option<DateTime<Utc>>,
}

/// Record payment for an existing order
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PaymentCreate {
    #[validate(length(min = 1))]
    pub order_id: String,
    #[validate(length(min = 1, max = 32))]
    pub payment_mode: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RefundRequest {
    #[validate(length(min = 1, max = 500))]
    pub reason: String,
}
