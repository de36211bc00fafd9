//! Table usage history, written alongside booking transitions

use shared::models::{Booking, HistoryStatus, TableHistoryEntry};

use crate::domain::new_id;
use crate::store::{StoreResult, StoreTxn};

fn ongoing_entry(txn: &StoreTxn, booking_id: &str) -> StoreResult<Option<TableHistoryEntry>> {
    Ok(txn
        .list::<TableHistoryEntry>()?
        .into_iter()
        .find(|e| e.booking_id == booking_id && e.status == HistoryStatus::Ongoing))
}

fn new_entry(txn: &StoreTxn, booking: &Booking, status: HistoryStatus) -> TableHistoryEntry {
    let now = txn.now();
    TableHistoryEntry {
        id: new_id(),
        version: 0,
        table_id: booking.table_id.clone(),
        table_number: booking.table_number.clone(),
        booking_id: booking.id.clone(),
        customer_id: booking.customer_id.clone(),
        customer_name: booking.customer_name.clone(),
        guests: booking.guests,
        date: booking.date,
        time_slot: booking.time_slot.clone(),
        status,
        check_in_time: None,
        check_out_time: None,
        duration_minutes: None,
        revenue: None,
        notes: None,
        created_at: now,
        updated_at: now,
    }
}

/// Check-in opens an ONGOING entry
pub fn open_entry(txn: &mut StoreTxn, booking: &Booking) -> StoreResult<TableHistoryEntry> {
    if let Some(existing) = ongoing_entry(txn, &booking.id)? {
        return Ok(existing);
    }
    let mut entry = new_entry(txn, booking, HistoryStatus::Ongoing);
    entry.check_in_time = Some(txn.now());
    txn.insert(&mut entry)?;
    Ok(entry)
}

/// Close the booking's ONGOING entry, or record a closed one when the
/// booking never checked in
pub fn close_entry(
    txn: &mut StoreTxn,
    booking: &Booking,
    status: HistoryStatus,
    revenue: Option<f64>,
    notes: Option<String>,
) -> StoreResult<TableHistoryEntry> {
    let now = txn.now();
    match ongoing_entry(txn, &booking.id)? {
        Some(mut entry) => {
            entry.status = status;
            entry.check_out_time = Some(now);
            entry.duration_minutes = entry
                .check_in_time
                .map(|check_in| (now - check_in).num_minutes().max(0));
            entry.revenue = revenue;
            entry.notes = notes;
            entry.updated_at = now;
            txn.update(&mut entry)?;
            Ok(entry)
        }
        None => {
            let mut entry = new_entry(txn, booking, status);
            entry.revenue = revenue;
            entry.notes = notes;
            txn.insert(&mut entry)?;
            Ok(entry)
        }
    }
}
