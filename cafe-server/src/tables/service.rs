use chrono::{DateTime, Utc};
use shared::models::{
    Booking, BookingStatus, CustomerPriority, DiningTable, DiningTableCreate, TableAssignment,
    TableHistoryEntry, TableStatus, TableSuggestion,
};

use super::priority;
use crate::domain::{DomainError, DomainResult, new_id};
use crate::store::{Store, StoreResult, StoreTxn};

/// Shown when a referenced customer record is gone
pub const UNKNOWN_CUSTOMER: &str = "Unknown Customer";

/// Status a table should show given the bookings that reference it.
///
/// A checked-in CONFIRMED booking makes it OCCUPIED, any other CONFIRMED
/// booking makes it BOOKED. PENDING requests do not hold the table.
pub fn derive_status<'a>(
    table_id: &str,
    bookings: &'a [Booking],
) -> (TableStatus, Option<&'a Booking>) {
    let mut confirmed: Vec<&Booking> = bookings
        .iter()
        .filter(|b| b.table_id == table_id && b.status == BookingStatus::Confirmed)
        .collect();
    confirmed.sort_by(|a, b| (a.date, a.created_at).cmp(&(b.date, b.created_at)));

    if let Some(seated) = confirmed.iter().find(|b| b.checked_in_at.is_some()) {
        return (TableStatus::Occupied, Some(seated));
    }
    match confirmed.first() {
        Some(next) => (TableStatus::Booked, Some(next)),
        None => (TableStatus::Free, None),
    }
}

/// Recompute the cached status of a table inside a booking transaction
pub fn refresh_table_status(txn: &mut StoreTxn, table_id: &str) -> StoreResult<DiningTable> {
    let mut table: DiningTable = txn.require(table_id)?;
    let bookings = txn.list::<Booking>()?;
    let (status, holder) = derive_status(table_id, &bookings);
    let holder_id = holder.map(|b| b.id.clone());

    if table.status != status || table.current_booking_id != holder_id {
        tracing::debug!(
            table_id = %table_id,
            from = ?table.status,
            to = ?status,
            "Table status refreshed"
        );
        table.status = status;
        table.current_booking_id = holder_id;
        table.updated_at = txn.now();
        txn.update(&mut table)?;
    }
    Ok(table)
}

#[derive(Clone)]
pub struct TableService {
    store: Store,
}

impl TableService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub fn create(&self, data: DiningTableCreate) -> DomainResult<DiningTable> {
        self.store.write(|txn| {
            let duplicate = txn.list::<DiningTable>()?.into_iter().any(|t| {
                t.location_id == data.location_id
                    && t.table_number.eq_ignore_ascii_case(&data.table_number)
            });
            if duplicate {
                return Err(DomainError::Conflict(format!(
                    "Table {} already exists at {}",
                    data.table_number, data.location_name
                )));
            }

            let now = txn.now();
            let mut table = DiningTable {
                id: new_id(),
                version: 0,
                table_number: data.table_number,
                capacity: data.capacity,
                position: data.position,
                location_id: data.location_id,
                location_name: data.location_name,
                status: TableStatus::Free,
                current_booking_id: None,
                created_at: now,
                updated_at: now,
            };
            txn.insert(&mut table)?;
            tracing::info!(
                table_id = %table.id,
                table_number = %table.table_number,
                "Table created"
            );
            Ok(table)
        })
    }

    pub fn get(&self, id: &str) -> DomainResult<DiningTable> {
        self.store
            .get(id)?
            .ok_or_else(|| DomainError::not_found("Table", id))
    }

    /// Sorted by location, then table number
    pub fn list(&self) -> DomainResult<Vec<DiningTable>> {
        let mut tables = self.store.list::<DiningTable>()?;
        tables.sort_by(|a, b| {
            (&a.location_id, &a.table_number).cmp(&(&b.location_id, &b.table_number))
        });
        Ok(tables)
    }

    /// Per-table view computed from the current bookings
    pub fn assignments(&self) -> DomainResult<Vec<TableAssignment>> {
        let bookings = self.store.list::<Booking>()?;
        let assignments = self
            .list()?
            .into_iter()
            .map(|table| {
                let (status, holder) = derive_status(&table.id, &bookings);
                TableAssignment {
                    table_id: table.id,
                    table_number: table.table_number,
                    capacity: table.capacity,
                    status,
                    booking_id: holder.map(|b| b.id.clone()),
                    customer_name: holder.map(|b| {
                        if b.customer_name.trim().is_empty() {
                            UNKNOWN_CUSTOMER.to_string()
                        } else {
                            b.customer_name.clone()
                        }
                    }),
                    guests: holder.map(|b| b.guests),
                }
            })
            .collect();
        Ok(assignments)
    }

    /// Usage history of one table, newest first
    pub fn history(&self, table_id: &str) -> DomainResult<Vec<TableHistoryEntry>> {
        self.get(table_id)?;
        let mut entries: Vec<TableHistoryEntry> = self
            .store
            .list::<TableHistoryEntry>()?
            .into_iter()
            .filter(|e| e.table_id == table_id)
            .collect();
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(entries)
    }

    pub fn priority_queue(&self, now: DateTime<Utc>) -> DomainResult<Vec<CustomerPriority>> {
        let bookings = self.store.list::<Booking>()?;
        Ok(priority::rank_pending(&bookings, now))
    }

    /// Suggest a FREE table; VIP treatment when `customer_id` has enough served visits
    pub fn suggest(
        &self,
        guests: u32,
        customer_id: Option<&str>,
    ) -> DomainResult<Option<TableSuggestion>> {
        if guests == 0 {
            return Err(DomainError::Validation("guests must be at least 1".to_string()));
        }
        let vip = match customer_id {
            Some(id) => priority::is_vip(id, &self.store.list::<Booking>()?),
            None => false,
        };
        Ok(priority::suggest_table(&self.list()?, guests, vip))
    }
}
