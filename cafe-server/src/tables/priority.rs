//! Priority heuristics for the pending-booking queue
//!
//! Display only: nothing here feeds back into booking creation or approval.

use chrono::{DateTime, Utc};
use shared::models::{
    Booking, BookingStatus, CustomerPriority, DiningTable, PriorityFactors, TableSuggestion,
};

/// Served bookings needed for VIP status
pub const VIP_THRESHOLD: u32 = 5;

const VIP_BONUS: u32 = 50;
const LOYALTY_PER_VISIT: u32 = 10;
const FREQUENCY_WEIGHT: u32 = 5;
const LARGE_PARTY_BONUS: u32 = 30;
const MEDIUM_PARTY_BONUS: u32 = 15;
const SPECIAL_REQUEST_BONUS: u32 = 20;
const MAX_WAIT_BONUS: u32 = 100;

const VIP_POSITIONS: [&str; 3] = ["vip", "private", "window"];

/// Served visits of a customer
pub fn completed_visits(customer_id: &str, history: &[Booking]) -> u32 {
    history
        .iter()
        .filter(|b| b.customer_id == customer_id && b.status == BookingStatus::Served)
        .count() as u32
}

pub fn is_vip(customer_id: &str, history: &[Booking]) -> bool {
    completed_visits(customer_id, history) >= VIP_THRESHOLD
}

/// Score one booking against the customer's booking history
pub fn calculate_customer_priority(
    booking: &Booking,
    history: &[Booking],
    now: DateTime<Utc>,
) -> CustomerPriority {
    let completed = completed_visits(&booking.customer_id, history);
    let frequency = history
        .iter()
        .filter(|b| b.customer_id == booking.customer_id)
        .count() as u32;
    let vip = completed >= VIP_THRESHOLD;
    let wait_minutes = (now - booking.created_at).num_minutes().max(0);

    let factors = PriorityFactors {
        vip_status: vip,
        loyalty_points: completed * LOYALTY_PER_VISIT,
        booking_frequency: frequency,
        party_size: booking.guests,
        special_requests: booking.has_special_requests(),
        wait_time_minutes: wait_minutes,
    };

    let party_bonus = match booking.guests {
        g if g >= 6 => LARGE_PARTY_BONUS,
        g if g >= 4 => MEDIUM_PARTY_BONUS,
        _ => 0,
    };
    let wait_bonus = u32::try_from(wait_minutes.saturating_mul(2))
        .unwrap_or(u32::MAX)
        .min(MAX_WAIT_BONUS);

    let score = if vip { VIP_BONUS } else { 0 }
        + factors.loyalty_points
        + FREQUENCY_WEIGHT * frequency
        + party_bonus
        + if factors.special_requests { SPECIAL_REQUEST_BONUS } else { 0 }
        + wait_bonus;

    CustomerPriority {
        customer_id: booking.customer_id.clone(),
        customer_name: booking.customer_name.clone(),
        booking_id: booking.id.clone(),
        score,
        factors,
    }
}

/// Every PENDING booking scored, highest first; ties go to the older booking
pub fn rank_pending(bookings: &[Booking], now: DateTime<Utc>) -> Vec<CustomerPriority> {
    let mut pending: Vec<&Booking> = bookings
        .iter()
        .filter(|b| b.status == BookingStatus::Pending)
        .collect();
    pending.sort_by_key(|b| b.created_at);

    let mut ranked: Vec<CustomerPriority> = pending
        .into_iter()
        .map(|b| calculate_customer_priority(b, bookings, now))
        .collect();
    // stable sort keeps the created_at order among equal scores
    ranked.sort_by(|a, b| b.score.cmp(&a.score));
    ranked
}

/// Pick a FREE table for a party.
///
/// VIP customers get a vip / private / window table first, large parties
/// (6+) a table with at most two spare seats, everyone else the smallest
/// FREE table that fits. Each rule falls through to the next when it finds
/// nothing.
pub fn suggest_table(tables: &[DiningTable], guests: u32, vip: bool) -> Option<TableSuggestion> {
    let mut candidates: Vec<&DiningTable> = tables
        .iter()
        .filter(|t| t.is_free() && t.fits(guests))
        .collect();
    candidates.sort_by(|a, b| {
        a.capacity
            .cmp(&b.capacity)
            .then_with(|| a.table_number.cmp(&b.table_number))
    });

    let suggestion = |table: &DiningTable, reason: String| TableSuggestion {
        table_id: table.id.clone(),
        table_number: table.table_number.clone(),
        capacity: table.capacity,
        reason,
    };

    if vip {
        let premium = candidates.iter().find(|t| {
            let position = t.position.to_lowercase();
            VIP_POSITIONS.iter().any(|p| position.contains(p))
        });
        if let Some(table) = premium {
            return Some(suggestion(
                table,
                format!("VIP customer: {} seating", table.position),
            ));
        }
    }

    if guests >= 6
        && let Some(table) = candidates.iter().find(|t| t.capacity <= guests + 2)
    {
        return Some(suggestion(
            table,
            format!("Large party of {guests} fits a {}-seat table", table.capacity),
        ));
    }

    candidates.first().map(|table| {
        suggestion(
            table,
            format!("Smallest free table for {guests} guests"),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};
    use shared::models::TableStatus;

    fn booking(id: &str, customer: &str, status: BookingStatus, guests: u32) -> Booking {
        let now = Utc::now();
        Booking {
            id: id.to_string(),
            version: 1,
            customer_id: customer.to_string(),
            customer_name: customer.to_uppercase(),
            customer_email: format!("{customer}@example.com"),
            customer_phone: None,
            table_id: "t-1".to_string(),
            table_number: "T1".to_string(),
            location_id: "loc-1".to_string(),
            location_name: "Downtown".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 3, 14).unwrap(),
            time_slot: "06:00 PM".to_string(),
            duration_minutes: 90,
            guests,
            status,
            special_requests: None,
            booking_reason: None,
            admin_note: None,
            rejection_reason: None,
            cancellation_reason: None,
            created_at: now,
            updated_at: now,
            confirmed_at: None,
            checked_in_at: None,
            served_at: None,
            cancelled_at: None,
        }
    }

    fn table(id: &str, capacity: u32, position: &str, status: TableStatus) -> DiningTable {
        let now = Utc::now();
        DiningTable {
            id: id.to_string(),
            version: 1,
            table_number: id.to_uppercase(),
            capacity,
            position: position.to_string(),
            location_id: "loc-1".to_string(),
            location_name: "Downtown".to_string(),
            status,
            current_booking_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_score_for_vip_with_large_party() {
        let mut history: Vec<Booking> = (0..5)
            .map(|i| booking(&format!("old-{i}"), "ana", BookingStatus::Served, 2))
            .collect();
        let mut pending = booking("b-1", "ana", BookingStatus::Pending, 6);
        pending.special_requests = Some("Birthday cake".to_string());
        let now = pending.created_at + Duration::minutes(10);
        history.push(pending.clone());

        let priority = calculate_customer_priority(&pending, &history, now);
        assert!(priority.factors.vip_status);
        assert_eq!(priority.factors.loyalty_points, 50);
        assert_eq!(priority.factors.booking_frequency, 6);
        // 50 vip + 50 loyalty + 30 frequency + 30 party + 20 special + 20 wait
        assert_eq!(priority.score, 200);
    }

    #[test]
    fn test_wait_bonus_is_capped() {
        let pending = booking("b-1", "ben", BookingStatus::Pending, 2);
        let now = pending.created_at + Duration::hours(5);
        let priority = calculate_customer_priority(&pending, std::slice::from_ref(&pending), now);
        // 5 frequency + 100 capped wait
        assert_eq!(priority.score, 105);
        assert_eq!(priority.factors.wait_time_minutes, 300);
    }

    #[test]
    fn test_rank_pending_orders_by_score_then_age() {
        let mut older = booking("b-old", "cat", BookingStatus::Pending, 2);
        older.created_at -= Duration::minutes(1);
        let newer = booking("b-new", "dan", BookingStatus::Pending, 2);
        let big = booking("b-big", "eve", BookingStatus::Pending, 4);
        let done = booking("b-done", "fay", BookingStatus::Confirmed, 8);
        let now = newer.created_at;

        let ranked = rank_pending(&[newer, done, big, older], now);
        let ids: Vec<&str> = ranked.iter().map(|p| p.booking_id.as_str()).collect();
        assert_eq!(ids, vec!["b-big", "b-old", "b-new"]);
    }

    #[test]
    fn test_suggest_table_rules() {
        let tables = vec![
            table("t2", 2, "Bar", TableStatus::Free),
            table("t4", 4, "Window", TableStatus::Free),
            table("t6", 6, "Center", TableStatus::Booked),
            table("t8", 8, "Patio", TableStatus::Free),
            table("t12", 12, "Hall", TableStatus::Free),
        ];

        let vip = suggest_table(&tables, 2, true).unwrap();
        assert_eq!(vip.table_id, "t4");

        let regular = suggest_table(&tables, 2, false).unwrap();
        assert_eq!(regular.table_id, "t2");

        let large = suggest_table(&tables, 7, false).unwrap();
        assert_eq!(large.table_id, "t8");

        assert!(suggest_table(&tables, 13, false).is_none());
    }
}
