//! Notification Model (站内通知)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Inbox owner: one account (customer or staff), or the shared admin inbox
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Recipient {
    User(String),
    Admin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationKind {
    BookingCreated,
    InstantBooking,
    BookingApproved,
    BookingRejected,
    BookingCancelled,
    BookingCheckedIn,
    BookingServed,
    BookingNoShow,
    StatusUpdate,
    OrderPlaced,
    OrderAccepted,
    OrderPreparing,
    OrderReady,
    OrderServed,
    OrderDelivered,
    OrderCancelled,
    OrderAssigned,
    OrderDelayed,
    RefundInitiated,
    RefundCompleted,
    FeedbackReceived,
    FeedbackResponse,
    Info,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    #[serde(default)]
    pub version: u64,
    pub recipient: Recipient,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    #[serde(default)]
    pub data: serde_json::Value,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnreadCount {
    pub unread: u32,
}
