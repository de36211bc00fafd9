//! 完整生命周期场景 - 落盘存储
//!
//! 桌台 T5 空闲 → 即时确认 → 入座 → 点单 → 厨师接单 → 厨师下线退回队列，
//! 同时校验变更日志连续且总线顺序与日志一致。

use std::time::Duration;

use cafe_server::message::TopicFilter;
use cafe_server::{Actor, Config, ServerState};
use chrono::{Days, Utc};
use shared::models::{
    BookingCreate, BookingStatus, DiningTableCreate, InviteAccept, InviteCreate, OrderCreate,
    OrderItemInput, OrderStatus, RegisterRequest, StaffRole, StaffStatus, TableStatus,
};
use tempfile::TempDir;

fn test_config(dir: &TempDir) -> Config {
    let mut config = Config::with_overrides(dir.path().to_string_lossy(), 0);
    config.tax_rate = 0.10;
    config
}

fn admin_actor(state: &ServerState) -> Actor {
    let admin = state
        .accounts
        .authenticate(&state.config.admin.email, &state.config.admin.password)
        .expect("seeded admin can log in");
    Actor::from(&admin)
}

fn item(id: &str, name: &str, price: f64) -> OrderItemInput {
    OrderItemInput {
        id: id.to_string(),
        name: name.to_string(),
        price,
        quantity: 1,
        special_instructions: None,
    }
}

#[tokio::test]
async fn test_booking_to_kitchen_requeue() {
    cafe_server::init_logger();
    let dir = TempDir::new().unwrap();
    let config = test_config(&dir);
    let state = ServerState::initialize(&config).unwrap();
    let admin = admin_actor(&state);

    let start_sequence = state.store.current_sequence().unwrap();
    let mut subscription = state.bus().subscribe(TopicFilter::all());

    // Table T5, FREE
    let table = state
        .tables
        .create(DiningTableCreate {
            table_number: "T5".to_string(),
            capacity: 4,
            position: "Window".to_string(),
            location_id: "loc-1".to_string(),
            location_name: "Downtown".to_string(),
        })
        .unwrap();
    assert_eq!(table.status, TableStatus::Free);

    let customer = state
        .accounts
        .register(RegisterRequest {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            password: "latte-lover".to_string(),
        })
        .unwrap();
    let customer = Actor::from(&customer);

    // Instant confirmation on a FREE table
    let booking = state
        .bookings
        .create(
            &customer,
            BookingCreate {
                table_id: table.id.clone(),
                date: Utc::now().date_naive().checked_add_days(Days::new(7)).unwrap(),
                time_slot: "06:00 PM".to_string(),
                guests: 2,
                duration_minutes: None,
                special_requests: None,
                booking_reason: None,
                customer_phone: None,
            },
        )
        .unwrap();
    assert_eq!(booking.status, BookingStatus::Confirmed);
    let confirmed_at = booking.confirmed_at.expect("confirmed booking has confirmed_at");
    assert!(confirmed_at >= booking.created_at);
    assert_eq!(state.tables.get(&table.id).unwrap().status, TableStatus::Booked);

    state.bookings.check_in(&booking.id).unwrap();
    assert_eq!(state.tables.get(&table.id).unwrap().status, TableStatus::Occupied);

    // latte + croissant at 10% tax
    let order = state
        .orders
        .create(
            &customer,
            OrderCreate {
                booking_id: booking.id.clone(),
                items: vec![item("latte", "Latte", 4.99), item("croissant", "Croissant", 3.49)],
                payment_mode: None,
            },
        )
        .unwrap();
    assert_eq!(order.subtotal, 8.48);
    assert_eq!(order.tax, 0.85);
    assert_eq!(order.total, 9.33);
    assert_eq!(order.table_number.as_deref(), Some("T5"));

    // Hire a chef through an invite
    let created = state
        .invites
        .create(
            &admin,
            InviteCreate {
                role: StaffRole::Chef,
                email: None,
            },
        )
        .unwrap();
    let chef = state
        .invites
        .accept(InviteAccept {
            token: created.token.clone(),
            name: "Remy".to_string(),
            email: "remy@cafe.local".to_string(),
            password: "ratatouille".to_string(),
        })
        .unwrap();
    assert!(!state.invites.validate(&created.token).unwrap().valid);

    let assigned = state.staff.assign_order(&order.id, &chef.id).unwrap();
    assert_eq!(assigned.status, OrderStatus::Preparing);
    assert_eq!(state.staff.get(&chef.id).unwrap().assigned_orders_count, 1);

    // Chef goes offline: order back to the queue
    let chef_account = state.accounts.get(&chef.id).unwrap();
    let change = state
        .staff
        .set_status(&Actor::from(&chef_account), &chef.id, StaffStatus::Unavailable)
        .unwrap();
    assert_eq!(change.affected_orders.len(), 1);
    assert_eq!(change.staff.assigned_orders_count, 0);

    let requeued = state.orders.get(&order.id).unwrap();
    assert_eq!(requeued.status, OrderStatus::Pending);
    assert!(requeued.assigned_to.is_none());
    assert!(state.orders.queue().unwrap().iter().any(|o| o.id == order.id));

    // Change log is gap-free and the bus delivered it in log order
    let end_sequence = state.store.current_sequence().unwrap();
    let log = state.store.changes_since(start_sequence, 10_000).unwrap();
    let expected: Vec<u64> = (start_sequence + 1..=end_sequence).collect();
    assert_eq!(log.iter().map(|c| c.sequence).collect::<Vec<_>>(), expected);

    let mut delivered = Vec::new();
    while delivered.len() < log.len() {
        let record = tokio::time::timeout(Duration::from_secs(1), subscription.recv())
            .await
            .expect("bus delivers every committed change")
            .unwrap();
        delivered.push(record);
    }
    assert_eq!(delivered, log);
}

#[tokio::test]
async fn test_state_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let config = test_config(&dir);

    let (table_id, sequence) = {
        let state = ServerState::initialize(&config).unwrap();
        let table = state
            .tables
            .create(DiningTableCreate {
                table_number: "T1".to_string(),
                capacity: 2,
                position: String::new(),
                location_id: "loc-1".to_string(),
                location_name: "Downtown".to_string(),
            })
            .unwrap();
        (table.id, state.store.current_sequence().unwrap())
    };

    let state = ServerState::initialize(&config).unwrap();
    assert_eq!(state.tables.get(&table_id).unwrap().table_number, "T1");
    // Admin is seeded once; the sequence continues where it stopped
    assert_eq!(state.store.current_sequence().unwrap(), sequence);
}
