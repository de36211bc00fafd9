use chrono::{DateTime, Duration, Utc};
use shared::models::{
    Account, AccountRole, Booking, BookingStatus, CustomerSession, CustomerStatus, Order,
    OrderStatus,
};

use crate::domain::{DomainError, DomainResult};
use crate::store::Store;

/// Customers idle for longer than this drop off the live list
const SESSION_IDLE_HOURS: i64 = 24;

fn latest<'a, T: 'a>(
    items: impl Iterator<Item = &'a T>,
    updated_at: impl Fn(&T) -> DateTime<Utc>,
) -> Option<&'a T> {
    items.max_by_key(|item| updated_at(item))
}

/// Build one customer's session from their own bookings and orders.
///
/// An order in flight wins over a booking; a finished visit only shows
/// when nothing else is open.
pub fn derive_session(
    account: &Account,
    bookings: &[Booking],
    orders: &[Order],
) -> CustomerSession {
    let active_order = latest(
        orders.iter().filter(|o| !o.status.is_terminal()),
        |o| o.updated_at,
    );
    let active_booking = latest(
        bookings.iter().filter(|b| b.status.is_active()),
        |b| b.updated_at,
    );

    let mut status = CustomerStatus::Browsing;
    let mut booking = None;
    let mut order = None;

    if let Some(o) = active_order {
        status = match o.status {
            OrderStatus::Ready | OrderStatus::Served => CustomerStatus::BeingServed,
            _ => CustomerStatus::OrderPlaced,
        };
        order = Some(o);
        booking = o
            .booking_id
            .as_deref()
            .and_then(|id| bookings.iter().find(|b| b.id == id));
    } else if let Some(b) = active_booking {
        status = match b.status {
            BookingStatus::Pending => CustomerStatus::WaitingApproval,
            _ => CustomerStatus::BookingConfirmed,
        };
        booking = Some(b);
    } else {
        let served = latest(
            bookings.iter().filter(|b| b.status == BookingStatus::Served),
            |b| b.updated_at,
        );
        let delivered = latest(
            orders.iter().filter(|o| o.status == OrderStatus::Delivered),
            |o| o.updated_at,
        );
        if served.is_some() || delivered.is_some() {
            status = CustomerStatus::Completed;
            booking = served;
            order = delivered;
        }
    }

    let last_activity = bookings
        .iter()
        .map(|b| b.updated_at)
        .chain(orders.iter().map(|o| o.updated_at))
        .chain(account.last_login_at)
        .fold(account.created_at, std::cmp::max);

    CustomerSession {
        customer_id: account.id.clone(),
        customer_name: account.name.clone(),
        customer_email: account.email.clone(),
        status,
        status_label: status.label().to_string(),
        login_time: account.last_login_at,
        last_activity,
        current_booking_id: booking.map(|b| b.id.clone()),
        current_order_id: order.map(|o| o.id.clone()),
        table_number: booking
            .map(|b| b.table_number.clone())
            .or_else(|| order.and_then(|o| o.table_number.clone())),
        location_id: booking.map(|b| b.location_id.clone()),
        location_name: booking.map(|b| b.location_name.clone()),
    }
}

#[derive(Clone)]
pub struct CustomerSessionService {
    store: Store,
}

impl CustomerSessionService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Active customers seen in the last day, most recent first
    pub fn list(&self, now: DateTime<Utc>) -> DomainResult<Vec<CustomerSession>> {
        let cutoff = now - Duration::hours(SESSION_IDLE_HOURS);
        let bookings = self.store.list::<Booking>()?;
        let orders = self.store.list::<Order>()?;

        let mut sessions: Vec<CustomerSession> = self
            .store
            .list::<Account>()?
            .iter()
            .filter(|a| a.role == AccountRole::Customer && a.is_active)
            .map(|account| session_for(account, &bookings, &orders))
            .filter(|s| s.last_activity >= cutoff)
            .collect();
        sessions.sort_by(|a, b| b.last_activity.cmp(&a.last_activity));
        Ok(sessions)
    }

    pub fn get(&self, customer_id: &str) -> DomainResult<CustomerSession> {
        let account = self
            .store
            .get::<Account>(customer_id)?
            .filter(|a| a.role == AccountRole::Customer)
            .ok_or_else(|| DomainError::not_found("Customer", customer_id))?;
        let bookings = self.store.list::<Booking>()?;
        let orders = self.store.list::<Order>()?;
        Ok(session_for(&account, &bookings, &orders))
    }
}

fn session_for(account: &Account, bookings: &[Booking], orders: &[Order]) -> CustomerSession {
    let own_bookings: Vec<Booking> = bookings
        .iter()
        .filter(|b| b.customer_id == account.id)
        .cloned()
        .collect();
    let own_orders: Vec<Order> = orders
        .iter()
        .filter(|o| o.customer_id == account.id)
        .cloned()
        .collect();
    derive_session(account, &own_bookings, &own_orders)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};
    use shared::models::PaymentStatus;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, hour, 0, 0).unwrap()
    }

    fn customer() -> Account {
        Account {
            id: "cust-1".to_string(),
            version: 1,
            name: "Amelie".to_string(),
            email: "amelie@example.com".to_string(),
            phone: None,
            role: AccountRole::Customer,
            password_hash: "hash".to_string(),
            is_active: true,
            invite_id: None,
            last_login_at: Some(at(9)),
            created_at: at(8),
            updated_at: at(9),
        }
    }

    fn booking(id: &str, status: BookingStatus, updated: u32) -> Booking {
        Booking {
            id: id.to_string(),
            version: 1,
            customer_id: "cust-1".to_string(),
            customer_name: "Amelie".to_string(),
            customer_email: "amelie@example.com".to_string(),
            customer_phone: None,
            table_id: "table-4".to_string(),
            table_number: "T4".to_string(),
            location_id: "terrace".to_string(),
            location_name: "Terrace".to_string(),
            date: NaiveDate::from_ymd_opt(2026, 3, 14).unwrap(),
            time_slot: "12:00 PM".to_string(),
            duration_minutes: 90,
            guests: 2,
            status,
            special_requests: None,
            booking_reason: None,
            admin_note: None,
            rejection_reason: None,
            cancellation_reason: None,
            created_at: at(9),
            updated_at: at(updated),
            confirmed_at: None,
            checked_in_at: None,
            served_at: None,
            cancelled_at: None,
        }
    }

    fn order(id: &str, status: OrderStatus, updated: u32) -> Order {
        Order {
            id: id.to_string(),
            version: 1,
            customer_id: "cust-1".to_string(),
            customer_name: "Amelie".to_string(),
            customer_email: "amelie@example.com".to_string(),
            booking_id: Some("b-1".to_string()),
            table_number: Some("T4".to_string()),
            items: Vec::new(),
            subtotal: 0.0,
            tax: 0.0,
            total: 0.0,
            status,
            payment_status: PaymentStatus::Unpaid,
            payment_id: None,
            assigned_to: None,
            assigned_staff_name: None,
            cancellation_reason: None,
            created_at: at(10),
            updated_at: at(updated),
            accepted_at: None,
            preparing_at: None,
            ready_at: None,
            served_at: None,
            delivered_at: None,
            cancelled_at: None,
        }
    }

    #[test]
    fn test_fresh_customer_is_browsing() {
        let session = derive_session(&customer(), &[], &[]);
        assert_eq!(session.status, CustomerStatus::Browsing);
        assert_eq!(session.status_label, "Browsing Menu");
        assert_eq!(session.last_activity, at(9));
        assert!(session.current_booking_id.is_none());
        assert!(session.table_number.is_none());
    }

    #[test]
    fn test_booking_status_drives_session() {
        let pending = [booking("b-1", BookingStatus::Pending, 10)];
        let session = derive_session(&customer(), &pending, &[]);
        assert_eq!(session.status, CustomerStatus::WaitingApproval);
        assert_eq!(session.current_booking_id.as_deref(), Some("b-1"));
        assert_eq!(session.location_name.as_deref(), Some("Terrace"));

        let confirmed = [booking("b-1", BookingStatus::Confirmed, 11)];
        let session = derive_session(&customer(), &confirmed, &[]);
        assert_eq!(session.status, CustomerStatus::BookingConfirmed);
        assert_eq!(session.table_number.as_deref(), Some("T4"));
        assert_eq!(session.last_activity, at(11));
    }

    #[test]
    fn test_open_order_wins_over_booking() {
        let bookings = [booking("b-1", BookingStatus::Confirmed, 10)];

        let session = derive_session(
            &customer(),
            &bookings,
            &[order("o-1", OrderStatus::Preparing, 12)],
        );
        assert_eq!(session.status, CustomerStatus::OrderPlaced);
        assert_eq!(session.current_order_id.as_deref(), Some("o-1"));
        assert_eq!(session.current_booking_id.as_deref(), Some("b-1"));
        assert_eq!(session.last_activity, at(12));

        let session = derive_session(
            &customer(),
            &bookings,
            &[order("o-1", OrderStatus::Served, 13)],
        );
        assert_eq!(session.status, CustomerStatus::BeingServed);
    }

    #[test]
    fn test_finished_visit_is_completed() {
        let session = derive_session(
            &customer(),
            &[booking("b-1", BookingStatus::Served, 14)],
            &[
                order("o-1", OrderStatus::Delivered, 13),
                order("o-2", OrderStatus::Cancelled, 15),
            ],
        );
        assert_eq!(session.status, CustomerStatus::Completed);
        assert_eq!(session.current_order_id.as_deref(), Some("o-1"));
        assert_eq!(session.last_activity, at(15));

        let session = derive_session(
            &customer(),
            &[booking("b-1", BookingStatus::Cancelled, 14)],
            &[],
        );
        assert_eq!(session.status, CustomerStatus::Browsing);
    }

    #[test]
    fn test_list_skips_idle_and_disabled_customers() {
        let store = Store::open_in_memory(crate::message::MessageBus::new()).unwrap();
        let now = Utc::now();
        store
            .write(|txn| {
                let mut recent = customer();
                recent.last_login_at = Some(now - Duration::hours(1));
                txn.insert(&mut recent)?;

                let mut idle = customer();
                idle.id = "cust-2".to_string();
                idle.created_at = now - Duration::days(3);
                idle.last_login_at = Some(now - Duration::days(2));
                txn.insert(&mut idle)?;

                let mut disabled = customer();
                disabled.id = "cust-3".to_string();
                disabled.is_active = false;
                disabled.last_login_at = Some(now);
                txn.insert(&mut disabled)?;
                Ok::<_, crate::store::StoreError>(())
            })
            .unwrap();

        let service = CustomerSessionService::new(store);
        let sessions = service.list(now).unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].customer_id, "cust-1");

        assert_eq!(service.get("cust-2").unwrap().status, CustomerStatus::Browsing);
        assert!(matches!(service.get("nobody"), Err(DomainError::NotFound { .. })));
    }
}
