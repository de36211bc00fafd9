//! Booking lifecycle service
//!
//! Each operation is one store transaction: the booking write, the table
//! status refresh, table history, cascaded order/payment changes and all
//! notifications commit together or not at all.

use chrono::{Days, NaiveDate, Utc};
use serde_json::json;
use shared::models::{
    Booking, BookingCancellation, BookingCreate, BookingStatus, DiningTable, HistoryStatus,
    NotificationKind, Order, OrderStatus, PaymentTransaction, Recipient, TableStatus,
    TransactionStatus,
};

use super::machine::{BookingEvent, transition};
use crate::core::config::BookingSettings;
use crate::domain::{Actor, DomainError, DomainResult, new_id, short_id};
use crate::notifications::notify;
use crate::orders::machine::can_cancel;
use crate::orders::money::sum_amounts;
use crate::orders::service::cancel_in_txn;
use crate::payments::service::flag_refund;
use crate::staff::recalculate_counts;
use crate::store::{Store, StoreTxn};
use crate::tables::history::{close_entry, open_entry};
use crate::tables::refresh_table_status;
use crate::utils::time::slots_overlap;

const DEFAULT_CANCEL_REASON: &str = "Cancelled by customer";

fn require_booking(txn: &StoreTxn, id: &str) -> DomainResult<Booking> {
    txn.get(id)?
        .ok_or_else(|| DomainError::not_found("Booking", id))
}

/// First active booking on the same table whose time window overlaps
fn find_overlap<'a>(
    bookings: &'a [Booking],
    table_id: &str,
    window: (NaiveDate, &str, u32),
    exclude: Option<&str>,
) -> Option<&'a Booking> {
    bookings.iter().find(|b| {
        b.table_id == table_id
            && b.status.is_active()
            && exclude != Some(b.id.as_str())
            && slots_overlap(window, (b.date, b.time_slot.as_str(), b.duration_minutes))
    })
}

/// Admin-facing record of every status change
fn status_update(txn: &mut StoreTxn, booking: &Booking, from: BookingStatus) -> DomainResult<()> {
    notify(
        txn,
        Recipient::Admin,
        NotificationKind::StatusUpdate,
        "Booking status changed",
        format!(
            "Booking {} status changed from {} to {}",
            booking.id, from, booking.status
        ),
        json!({ "booking_id": booking.id, "from": from, "to": booking.status }),
    )?;
    tracing::info!(
        booking_id = %booking.id,
        from = %from,
        to = %booking.status,
        "Booking status changed"
    );
    Ok(())
}

#[derive(Clone)]
pub struct BookingService {
    store: Store,
    settings: BookingSettings,
}

impl BookingService {
    pub fn new(store: Store, settings: BookingSettings) -> Self {
        Self { store, settings }
    }

    fn ensure_no_overlap(
        &self,
        txn: &StoreTxn,
        booking: &Booking,
        exclude: Option<&str>,
    ) -> DomainResult<()> {
        if !self.settings.prevent_double_booking {
            return Ok(());
        }
        let bookings = txn.list::<Booking>()?;
        let window = (booking.date, booking.time_slot.as_str(), booking.duration_minutes);
        if let Some(existing) = find_overlap(&bookings, &booking.table_id, window, exclude) {
            return Err(DomainError::Conflict(format!(
                "Table {} is already booked on {} at {} (booking {})",
                booking.table_number,
                existing.date,
                existing.time_slot,
                short_id(&existing.id)
            )));
        }
        Ok(())
    }

    /// Bookable dates run from today to `max_advance_days` ahead
    fn ensure_bookable_date(&self, date: NaiveDate) -> DomainResult<()> {
        let today = Utc::now().date_naive();
        if date < today {
            return Err(DomainError::Validation(format!(
                "Booking date {date} is in the past"
            )));
        }
        let horizon = today
            .checked_add_days(Days::new(u64::from(self.settings.max_advance_days)))
            .unwrap_or(NaiveDate::MAX);
        if date > horizon {
            return Err(DomainError::Validation(format!(
                "Bookings open at most {} days ahead",
                self.settings.max_advance_days
            )));
        }
        Ok(())
    }

    /// A FREE table confirms instantly; otherwise the request waits for an admin
    pub fn create(&self, actor: &Actor, data: BookingCreate) -> DomainResult<Booking> {
        self.ensure_bookable_date(data.date)?;
        if data.guests == 0 {
            return Err(DomainError::Validation("guests must be at least 1".to_string()));
        }
        if data.time_slot.trim().is_empty() {
            return Err(DomainError::Validation("time slot is required".to_string()));
        }

        self.store.write(|txn| {
            let table: DiningTable = txn
                .get(&data.table_id)?
                .ok_or_else(|| DomainError::not_found("Table", &data.table_id))?;
            if !table.fits(data.guests) {
                return Err(DomainError::BusinessRule(format!(
                    "Table {} seats {}, requested {} guests",
                    table.table_number, table.capacity, data.guests
                )));
            }

            let now = txn.now();
            let instant = table.status == TableStatus::Free;
            let mut booking = Booking {
                id: new_id(),
                version: 0,
                customer_id: actor.id.clone(),
                customer_name: actor.name.clone(),
                customer_email: actor.email.clone(),
                customer_phone: data.customer_phone,
                table_id: table.id.clone(),
                table_number: table.table_number.clone(),
                location_id: table.location_id.clone(),
                location_name: table.location_name.clone(),
                date: data.date,
                time_slot: data.time_slot.trim().to_string(),
                duration_minutes: data
                    .duration_minutes
                    .unwrap_or(self.settings.default_duration_minutes),
                guests: data.guests,
                status: if instant {
                    BookingStatus::Confirmed
                } else {
                    BookingStatus::Pending
                },
                special_requests: data.special_requests,
                booking_reason: data.booking_reason,
                admin_note: None,
                rejection_reason: None,
                cancellation_reason: None,
                created_at: now,
                updated_at: now,
                confirmed_at: instant.then_some(now),
                checked_in_at: None,
                served_at: None,
                cancelled_at: None,
            };
            self.ensure_no_overlap(txn, &booking, None)?;
            txn.insert(&mut booking)?;
            refresh_table_status(txn, &booking.table_id)?;

            if instant {
                notify(
                    txn,
                    Recipient::Admin,
                    NotificationKind::InstantBooking,
                    "Instant booking",
                    format!(
                        "Instant booking confirmed for {} - Table {}",
                        booking.customer_name, booking.table_number
                    ),
                    json!({ "booking_id": booking.id }),
                )?;
                notify(
                    txn,
                    Recipient::User(booking.customer_id.clone()),
                    NotificationKind::BookingApproved,
                    "✅ Table Reserved Instantly!",
                    format!(
                        "Your table {} is confirmed and ready! You can now order food.",
                        booking.table_number
                    ),
                    json!({
                        "booking_id": booking.id,
                        "table_number": booking.table_number,
                        "date": booking.date,
                        "time_slot": booking.time_slot,
                    }),
                )?;
            } else {
                notify(
                    txn,
                    Recipient::Admin,
                    NotificationKind::BookingCreated,
                    "New booking request",
                    format!(
                        "New booking request from {} for {} guests",
                        booking.customer_name, booking.guests
                    ),
                    json!({ "booking_id": booking.id }),
                )?;
            }

            tracing::info!(
                booking_id = %booking.id,
                table_id = %booking.table_id,
                status = %booking.status,
                "Booking created"
            );
            Ok(booking)
        })
    }

    pub fn approve(&self, id: &str, note: Option<String>) -> DomainResult<Booking> {
        self.store.write(|txn| {
            let mut booking = require_booking(txn, id)?;
            let from = booking.status;
            booking.status = transition(from, BookingEvent::Approve)?;
            self.ensure_no_overlap(txn, &booking, Some(id))?;

            let now = txn.now();
            booking.confirmed_at = Some(now);
            if let Some(note) = note.filter(|n| !n.trim().is_empty()) {
                booking.admin_note = Some(note);
            }
            booking.updated_at = now;
            txn.update(&mut booking)?;
            refresh_table_status(txn, &booking.table_id)?;

            notify(
                txn,
                Recipient::User(booking.customer_id.clone()),
                NotificationKind::BookingApproved,
                "🎉 Your table is reserved!",
                format!(
                    "Your booking for table {} has been approved. You can now order food.",
                    booking.table_number
                ),
                json!({
                    "booking_id": booking.id,
                    "table_number": booking.table_number,
                    "date": booking.date,
                    "time_slot": booking.time_slot,
                }),
            )?;
            status_update(txn, &booking, from)?;
            Ok(booking)
        })
    }

    pub fn reject(&self, id: &str, reason: &str) -> DomainResult<Booking> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(DomainError::Validation(
                "A rejection reason is required".to_string(),
            ));
        }

        self.store.write(|txn| {
            let mut booking = require_booking(txn, id)?;
            let from = booking.status;
            booking.status = transition(from, BookingEvent::Reject)?;

            let now = txn.now();
            booking.rejection_reason = Some(reason.to_string());
            booking.cancelled_at = Some(now);
            booking.updated_at = now;
            txn.update(&mut booking)?;
            refresh_table_status(txn, &booking.table_id)?;
            close_entry(
                txn,
                &booking,
                HistoryStatus::Cancelled,
                None,
                Some(format!("Rejected: {reason}")),
            )?;

            notify(
                txn,
                Recipient::User(booking.customer_id.clone()),
                NotificationKind::BookingRejected,
                "Booking Request Update",
                format!(
                    "Unfortunately, your booking request has been declined. Reason: {reason}"
                ),
                json!({ "booking_id": booking.id, "rejection_reason": reason }),
            )?;
            status_update(txn, &booking, from)?;
            Ok(booking)
        })
    }

    /// Cancel a booking and everything hanging off it.
    ///
    /// Cancellable orders are cancelled, PAID payments of the booking are
    /// flagged PENDING_REFUND, the table is released and a CANCELLED history
    /// entry is written.
    pub fn cancel(
        &self,
        actor: &Actor,
        id: &str,
        reason: Option<String>,
    ) -> DomainResult<BookingCancellation> {
        let reason = reason
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| DEFAULT_CANCEL_REASON.to_string());

        self.store.write(|txn| {
            let mut booking = require_booking(txn, id)?;
            actor.ensure_owner(&booking.customer_id, "booking")?;
            let from = booking.status;
            booking.status = transition(from, BookingEvent::Cancel)?;

            let now = txn.now();
            booking.cancellation_reason = Some(reason.clone());
            booking.cancelled_at = Some(now);
            booking.updated_at = now;
            txn.update(&mut booking)?;

            let mut cancelled_order_ids = Vec::new();
            let mut refund_payment_ids = Vec::new();
            let order_reason = format!("Booking cancelled: {reason}");
            let orders: Vec<Order> = txn
                .list::<Order>()?
                .into_iter()
                .filter(|o| o.booking_id.as_deref() == Some(id) && can_cancel(o.status))
                .collect();
            for order in orders {
                let cancellation = cancel_in_txn(txn, order, &order_reason)?;
                cancelled_order_ids.push(cancellation.order.id);
                refund_payment_ids.extend(cancellation.refund_payment_id);
            }

            // payments of the booking not already flagged through an order
            let payments: Vec<PaymentTransaction> = txn
                .list::<PaymentTransaction>()?
                .into_iter()
                .filter(|p| {
                    p.booking_id.as_deref() == Some(id) && p.status == TransactionStatus::Paid
                })
                .collect();
            for mut payment in payments {
                if flag_refund(txn, &mut payment, &reason)? {
                    refund_payment_ids.push(payment.id);
                }
            }

            recalculate_counts(txn)?;
            refresh_table_status(txn, &booking.table_id)?;
            close_entry(txn, &booking, HistoryStatus::Cancelled, None, Some(reason.clone()))?;

            notify(
                txn,
                Recipient::User(booking.customer_id.clone()),
                NotificationKind::BookingCancelled,
                "Booking Cancelled",
                format!(
                    "Your booking for table {} has been cancelled. Reason: {}",
                    booking.table_number, reason
                ),
                json!({ "booking_id": booking.id, "table_number": booking.table_number }),
            )?;
            notify(
                txn,
                Recipient::Admin,
                NotificationKind::BookingCancelled,
                "Booking cancelled",
                format!("Booking cancelled by {}: {}", actor.name, reason),
                json!({
                    "booking_id": booking.id,
                    "cancelled_orders": cancelled_order_ids,
                    "refund_payments": refund_payment_ids,
                }),
            )?;
            status_update(txn, &booking, from)?;

            Ok(BookingCancellation {
                booking,
                cancelled_order_ids,
                refund_payment_ids,
            })
        })
    }

    /// Seat the party: the table becomes OCCUPIED and history opens
    pub fn check_in(&self, id: &str) -> DomainResult<Booking> {
        self.store.write(|txn| {
            let mut booking = require_booking(txn, id)?;
            booking.status = transition(booking.status, BookingEvent::CheckIn)?;
            if booking.checked_in_at.is_some() {
                return Err(DomainError::BusinessRule(format!(
                    "Booking {} is already checked in",
                    short_id(id)
                )));
            }

            let now = txn.now();
            booking.checked_in_at = Some(now);
            booking.updated_at = now;
            txn.update(&mut booking)?;
            refresh_table_status(txn, &booking.table_id)?;
            open_entry(txn, &booking)?;

            notify(
                txn,
                Recipient::User(booking.customer_id.clone()),
                NotificationKind::BookingCheckedIn,
                "Welcome!",
                format!("You are checked in at table {}.", booking.table_number),
                json!({ "booking_id": booking.id, "table_number": booking.table_number }),
            )?;
            tracing::info!(
                booking_id = %booking.id,
                table_id = %booking.table_id,
                "Booking checked in"
            );
            Ok(booking)
        })
    }

    /// Close the visit; revenue is the sum of the booking's non-cancelled orders
    pub fn mark_served(&self, id: &str) -> DomainResult<Booking> {
        self.store.write(|txn| {
            let mut booking = require_booking(txn, id)?;
            let from = booking.status;
            booking.status = transition(from, BookingEvent::MarkServed)?;

            let now = txn.now();
            booking.served_at = Some(now);
            booking.updated_at = now;
            txn.update(&mut booking)?;

            let revenue = sum_amounts(
                txn.list::<Order>()?
                    .into_iter()
                    .filter(|o| {
                        o.booking_id.as_deref() == Some(id)
                            && o.status != OrderStatus::Cancelled
                    })
                    .map(|o| o.total),
            );
            refresh_table_status(txn, &booking.table_id)?;
            close_entry(txn, &booking, HistoryStatus::Completed, Some(revenue), None)?;

            notify(
                txn,
                Recipient::User(booking.customer_id.clone()),
                NotificationKind::BookingServed,
                "Thanks for visiting!",
                format!(
                    "Your visit at table {} is complete. We hope to see you again soon.",
                    booking.table_number
                ),
                json!({ "booking_id": booking.id, "revenue": revenue }),
            )?;
            status_update(txn, &booking, from)?;
            Ok(booking)
        })
    }

    pub fn mark_no_show(&self, id: &str) -> DomainResult<Booking> {
        self.store.write(|txn| {
            let mut booking = require_booking(txn, id)?;
            let from = booking.status;
            booking.status = transition(from, BookingEvent::MarkNoShow)?;
            booking.updated_at = txn.now();
            txn.update(&mut booking)?;
            refresh_table_status(txn, &booking.table_id)?;
            close_entry(txn, &booking, HistoryStatus::NoShow, None, None)?;

            notify(
                txn,
                Recipient::User(booking.customer_id.clone()),
                NotificationKind::BookingNoShow,
                "Booking missed",
                format!(
                    "Your booking for table {} on {} at {} was marked as a no-show.",
                    booking.table_number, booking.date, booking.time_slot
                ),
                json!({ "booking_id": booking.id }),
            )?;
            status_update(txn, &booking, from)?;
            Ok(booking)
        })
    }

    pub fn get(&self, id: &str) -> DomainResult<Booking> {
        self.store
            .get(id)?
            .ok_or_else(|| DomainError::not_found("Booking", id))
    }

    /// Newest first
    pub fn list(&self, status: Option<BookingStatus>) -> DomainResult<Vec<Booking>> {
        self.filtered(|b| status.is_none_or(|s| b.status == s))
    }

    pub fn list_by_customer(&self, customer_id: &str) -> DomainResult<Vec<Booking>> {
        self.filtered(|b| b.customer_id == customer_id)
    }

    fn filtered(&self, keep: impl Fn(&Booking) -> bool) -> DomainResult<Vec<Booking>> {
        let mut bookings: Vec<Booking> = self
            .store
            .list::<Booking>()?
            .into_iter()
            .filter(|b| keep(b))
            .collect();
        bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(bookings)
    }
}
