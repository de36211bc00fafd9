//! Order Model (点单)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

/// Order status
///
/// Forward path: PENDING → ACCEPTED → PREPARING → READY → SERVED → DELIVERED.
/// CANCELLED is reachable from PENDING / ACCEPTED / PREPARING.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Accepted,
    Preparing,
    Ready,
    Served,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }

    /// Kitchen stages, where a chef holds the order
    pub fn is_kitchen_stage(self) -> bool {
        matches!(self, Self::Pending | Self::Accepted | Self::Preparing)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Accepted => "ACCEPTED",
            Self::Preparing => "PREPARING",
            Self::Ready => "READY",
            Self::Served => "SERVED",
            Self::Delivered => "DELIVERED",
            Self::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payment state carried on the order
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    #[default]
    Unpaid,
    Paid,
    RefundPending,
    Refunded,
}

/// Ordered line item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    /// Menu item id
    pub id: String,
    pub name: String,
    /// Unit price
    pub price: f64,
    pub quantity: u32,
    pub special_instructions: Option<String>,
}

/// Food order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    #[serde(default)]
    pub version: u64,
    pub customer_id: String,
    pub customer_name: String,
    pub customer_email: String,
    pub booking_id: Option<String>,
    pub table_number: Option<String>,
    pub items: Vec<OrderItem>,
    pub subtotal: f64,
    pub tax: f64,
    pub total: f64,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    /// Payment transaction recorded at checkout
    pub payment_id: Option<String>,
    /// Staff id currently holding the order; `None` means queued
    pub assigned_to: Option<String>,
    pub assigned_staff_name: Option<String>,
    pub cancellation_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub accepted_at: Option<DateTime<Utc>>,
    pub preparing_at: Option<DateTime<Utc>>,
    pub ready_at: Option<DateTime<Utc>>,
    pub served_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl Order {
    pub fn is_queued(&self) -> bool {
        self.assigned_to.is_none() && !self.status.is_terminal()
    }
}

/// Cart line submitted at checkout
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct OrderItemInput {
    #[validate(length(min = 1))]
    pub id: String,
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub price: f64,
    #[validate(range(min = 1, max = 99))]
    pub quantity: u32,
    #[validate(length(max = 500))]
    pub special_instructions: Option<String>,
}

/// Create order payload (checkout)
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct OrderCreate {
    #[validate(length(min = 1))]
    pub booking_id: String,
    #[validate(length(min = 1), nested)]
    pub items: Vec<OrderItemInput>,
    /// When set, the order is paid at checkout with this mode (CARD, UPI, CASH...)
    #[validate(length(min = 1, max = 32))]
    pub payment_mode: Option<String>,
}

/// Cancel payload
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct OrderCancel {
    #[validate(length(max = 500))]
    pub reason: Option<String>,
}

/// Assign / reassign payload
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct OrderAssign {
    #[validate(length(min = 1))]
    pub staff_id: String,
}

/// Result of an order cancellation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCancellation {
    pub order: Order,
    /// Payment flipped to PENDING_REFUND by this cancellation
    pub refund_payment_id: Option<String>,
}
