//! Booking Model (桌台预订)

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

/// Booking status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
    Served,
    NoShow,
}

impl BookingStatus {
    /// PENDING and CONFIRMED bookings hold their table
    pub fn is_active(self) -> bool {
        matches!(self, Self::Pending | Self::Confirmed)
    }

    pub fn is_terminal(self) -> bool {
        !self.is_active()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Confirmed => "CONFIRMED",
            Self::Cancelled => "CANCELLED",
            Self::Served => "SERVED",
            Self::NoShow => "NO_SHOW",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Table reservation record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: String,
    #[serde(default)]
    pub version: u64,
    pub customer_id: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: Option<String>,
    pub table_id: String,
    pub table_number: String,
    pub location_id: String,
    pub location_name: String,
    pub date: NaiveDate,
    /// Display slot, e.g. "06:00 PM"
    pub time_slot: String,
    pub duration_minutes: u32,
    pub guests: u32,
    pub status: BookingStatus,
    pub special_requests: Option<String>,
    pub booking_reason: Option<String>,
    pub admin_note: Option<String>,
    pub rejection_reason: Option<String>,
    pub cancellation_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub checked_in_at: Option<DateTime<Utc>>,
    pub served_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl Booking {
    pub fn has_special_requests(&self) -> bool {
        self.special_requests
            .as_deref()
            .is_some_and(|s| !s.trim().is_empty())
    }
}

/// Create booking payload (customer submits)
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BookingCreate {
    #[validate(length(min = 1))]
    pub table_id: String,
    pub date: NaiveDate,
    #[validate(length(min = 1, max = 16))]
    pub time_slot: String,
    #[validate(range(min = 1, max = 50))]
    pub guests: u32,
    #[validate(range(min = 15, max = 480))]
    pub duration_minutes: Option<u32>,
    #[validate(length(max = 500))]
    pub special_requests: Option<String>,
    #[validate(length(max = 200))]
    pub booking_reason: Option<String>,
    #[validate(length(max = 32))]
    pub customer_phone: Option<String>,
}

/// Approve payload (admin, optional note)
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct BookingApprove {
    #[validate(length(max = 500))]
    pub note: Option<String>,
}

/// Reject payload (admin, reason required)
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BookingReject {
    #[validate(length(min = 1, max = 500))]
    pub reason: String,
}

/// Cancel payload (customer or admin)
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct BookingCancel {
    #[validate(length(max = 500))]
    pub reason: Option<String>,
}

/// Result of a booking cancellation with its cascaded effects
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingCancellation {
    pub booking: Booking,
    /// Orders cancelled along with the booking
    pub cancelled_order_ids: Vec<String>,
    /// Payments flagged PENDING_REFUND
    pub refund_payment_ids: Vec<String>,
}
