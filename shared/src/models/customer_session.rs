//! Customer Session Model (顾客实时状态)
//!
//! Derived on read from the customer's account, bookings and orders;
//! never stored. Clients follow it through the `bookings` / `orders`
//! change records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where a customer is in their visit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CustomerStatus {
    /// Logged in, nothing in flight
    Browsing,
    /// Booking request waiting for an admin
    WaitingApproval,
    /// Table confirmed, may order
    BookingConfirmed,
    /// Order in the kitchen (PENDING / ACCEPTED / PREPARING)
    OrderPlaced,
    /// Order READY or SERVED
    BeingServed,
    /// Last visit served / delivered
    Completed,
}

impl CustomerStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Browsing => "Browsing Menu",
            Self::WaitingApproval => "Waiting for Approval",
            Self::BookingConfirmed => "Booking Confirmed",
            Self::OrderPlaced => "Order Placed",
            Self::BeingServed => "Being Served",
            Self::Completed => "Completed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerSession {
    pub customer_id: String,
    pub customer_name: String,
    pub customer_email: String,
    pub status: CustomerStatus,
    pub status_label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub login_time: Option<DateTime<Utc>>,
    pub last_activity: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_booking_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_order_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_name: Option<String>,
}
