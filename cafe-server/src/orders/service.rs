//! Order lifecycle service
//!
//! Every status change runs in one store transaction together with its
//! notifications, the payment side effects and the staff count refresh.

use serde_json::json;
use shared::models::{
    Booking, BookingStatus, NotificationKind, Order, OrderCancellation, OrderCreate, OrderItem,
    OrderStatus, PaymentStatus, PaymentTransaction, Recipient, StaffMember, StaffRole,
};

use super::machine::{OrderEvent, transition};
use super::money::{calculate_totals, validate_line};
use crate::domain::{Actor, DomainError, DomainResult, new_id, short_id};
use crate::notifications::notify;
use crate::payments::service::{flag_refund, record_payment};
use crate::staff::recalculate_counts;
use crate::store::{Store, StoreTxn};

const DEFAULT_CANCEL_REASON: &str = "Cancelled by customer";

fn require_order(txn: &StoreTxn, id: &str) -> DomainResult<Order> {
    txn.get(id)?.ok_or_else(|| DomainError::not_found("Order", id))
}

/// The payment an order was settled with
fn linked_payment(txn: &StoreTxn, order: &Order) -> DomainResult<Option<PaymentTransaction>> {
    if let Some(payment_id) = &order.payment_id
        && let Some(payment) = txn.get::<PaymentTransaction>(payment_id)?
    {
        return Ok(Some(payment));
    }
    Ok(txn
        .list::<PaymentTransaction>()?
        .into_iter()
        .find(|p| p.order_id.as_deref() == Some(order.id.as_str())))
}

/// Cancel an order inside the caller's transaction.
///
/// A PAID order flags its payment PENDING_REFUND; a payment that is no
/// longer PAID is left alone.
pub(crate) fn cancel_in_txn(
    txn: &mut StoreTxn,
    mut order: Order,
    reason: &str,
) -> DomainResult<OrderCancellation> {
    let now = txn.now();
    order.status = transition(order.status, OrderEvent::Cancel)?;
    order.cancellation_reason = Some(reason.to_string());
    order.cancelled_at = Some(now);
    order.updated_at = now;

    let mut refund_payment_id = None;
    if order.payment_status == PaymentStatus::Paid
        && let Some(mut payment) = linked_payment(txn, &order)?
        && flag_refund(txn, &mut payment, reason)?
    {
        order.payment_status = PaymentStatus::RefundPending;
        refund_payment_id = Some(payment.id);
    }
    txn.update(&mut order)?;

    notify(
        txn,
        Recipient::User(order.customer_id.clone()),
        NotificationKind::OrderCancelled,
        "❌ Order Cancelled",
        format!(
            "Your order #{} has been cancelled. Reason: {}",
            short_id(&order.id),
            reason
        ),
        json!({ "order_id": order.id, "reason": reason }),
    )?;

    tracing::info!(
        order_id = %order.id,
        refund_payment_id = ?refund_payment_id,
        "Order cancelled"
    );
    Ok(OrderCancellation {
        order,
        refund_payment_id,
    })
}

#[derive(Clone)]
pub struct OrderService {
    store: Store,
    tax_rate: f64,
}

impl OrderService {
    pub fn new(store: Store, tax_rate: f64) -> Self {
        Self { store, tax_rate }
    }

    /// Checkout. The cart must belong to a CONFIRMED booking of the caller.
    pub fn create(&self, actor: &Actor, data: OrderCreate) -> DomainResult<Order> {
        if data.items.is_empty() {
            return Err(DomainError::Validation("Cart is empty".to_string()));
        }
        for item in &data.items {
            validate_line(item)?;
        }

        let items: Vec<OrderItem> = data
            .items
            .into_iter()
            .map(|i| OrderItem {
                id: i.id,
                name: i.name,
                price: i.price,
                quantity: i.quantity,
                special_instructions: i.special_instructions,
            })
            .collect();
        let totals = calculate_totals(&items, self.tax_rate);

        self.store.write(|txn| {
            let booking: Booking = txn
                .get(&data.booking_id)?
                .ok_or_else(|| DomainError::not_found("Booking", &data.booking_id))?;
            actor.ensure_owner(&booking.customer_id, "booking")?;
            if booking.status != BookingStatus::Confirmed {
                return Err(DomainError::BusinessRule(format!(
                    "Orders need a CONFIRMED booking, booking {} is {}",
                    short_id(&booking.id),
                    booking.status
                )));
            }

            let now = txn.now();
            let mut order = Order {
                id: new_id(),
                version: 0,
                customer_id: booking.customer_id.clone(),
                customer_name: booking.customer_name.clone(),
                customer_email: booking.customer_email.clone(),
                booking_id: Some(booking.id.clone()),
                table_number: Some(booking.table_number.clone()),
                items,
                subtotal: totals.subtotal,
                tax: totals.tax,
                total: totals.total,
                status: OrderStatus::Pending,
                payment_status: PaymentStatus::Unpaid,
                payment_id: None,
                assigned_to: None,
                assigned_staff_name: None,
                cancellation_reason: None,
                created_at: now,
                updated_at: now,
                accepted_at: None,
                preparing_at: None,
                ready_at: None,
                served_at: None,
                delivered_at: None,
                cancelled_at: None,
            };

            if let Some(mode) = &data.payment_mode {
                let payment = record_payment(txn, &order, mode)?;
                order.payment_status = PaymentStatus::Paid;
                order.payment_id = Some(payment.id);
            }
            txn.insert(&mut order)?;

            notify(
                txn,
                Recipient::Admin,
                NotificationKind::OrderPlaced,
                "New order",
                format!(
                    "{} placed order #{} for table {} (${:.2})",
                    order.customer_name,
                    short_id(&order.id),
                    booking.table_number,
                    order.total
                ),
                json!({ "order_id": order.id, "booking_id": booking.id }),
            )?;
            notify(
                txn,
                Recipient::User(order.customer_id.clone()),
                NotificationKind::OrderPlaced,
                "🧾 Order placed",
                format!(
                    "Your order #{} has been placed and is waiting for the kitchen.",
                    short_id(&order.id)
                ),
                json!({ "order_id": order.id }),
            )?;

            tracing::info!(
                order_id = %order.id,
                booking_id = %booking.id,
                items = order.items.len(),
                total = order.total,
                "Order created"
            );
            Ok(order)
        })
    }

    /// Apply a forward transition, stamp it and notify the customer
    fn advance(&self, id: &str, event: OrderEvent, actor: Option<&Actor>) -> DomainResult<Order> {
        self.store.write(|txn| {
            let mut order = require_order(txn, id)?;
            let now = txn.now();
            order.status = transition(order.status, event)?;

            let (kind, title, message) = match order.status {
                OrderStatus::Accepted => {
                    order.accepted_at = Some(now);
                    (
                        NotificationKind::OrderAccepted,
                        "👍 Order accepted",
                        format!("Your order #{} has been accepted by the kitchen.", short_id(id)),
                    )
                }
                OrderStatus::Preparing => {
                    order.preparing_at = Some(now);
                    order.accepted_at.get_or_insert(now);
                    // the chef who starts an unassigned order takes it
                    if order.assigned_to.is_none()
                        && let Some(actor) = actor
                        && let Some(member) = txn.get::<StaffMember>(&actor.id)?
                        && member.role == StaffRole::Chef
                    {
                        order.assigned_to = Some(member.id);
                        order.assigned_staff_name = Some(member.name);
                    }
                    (
                        NotificationKind::OrderPreparing,
                        "👨‍🍳 Your order is being prepared!",
                        format!("Your order #{} is now being prepared by our chef.", short_id(id)),
                    )
                }
                OrderStatus::Ready => {
                    order.ready_at = Some(now);
                    (
                        NotificationKind::OrderReady,
                        "✅ Your order is ready!",
                        format!("Your order #{} is ready and will be served soon.", short_id(id)),
                    )
                }
                OrderStatus::Served => {
                    order.served_at = Some(now);
                    (
                        NotificationKind::OrderServed,
                        "🎉 Enjoy your meal!",
                        format!("Your order #{} has been served. Bon appétit!", short_id(id)),
                    )
                }
                OrderStatus::Delivered => {
                    order.delivered_at = Some(now);
                    (
                        NotificationKind::OrderDelivered,
                        "Order complete",
                        format!("Your order #{} is complete. Thank you!", short_id(id)),
                    )
                }
                OrderStatus::Pending | OrderStatus::Cancelled => {
                    return Err(DomainError::invalid_transition(
                        "order",
                        order.status,
                        event.as_str(),
                    ));
                }
            };
            order.updated_at = now;
            txn.update(&mut order)?;
            recalculate_counts(txn)?;

            notify(
                txn,
                Recipient::User(order.customer_id.clone()),
                kind,
                title,
                message,
                json!({
                    "order_id": order.id,
                    "status": order.status,
                    "table_number": order.table_number,
                }),
            )?;
            tracing::info!(order_id = %order.id, status = %order.status, "Order status changed");
            Ok(order)
        })
    }

    pub fn accept(&self, id: &str) -> DomainResult<Order> {
        self.advance(id, OrderEvent::Accept, None)
    }

    pub fn start_preparing(&self, actor: &Actor, id: &str) -> DomainResult<Order> {
        self.advance(id, OrderEvent::StartPreparing, Some(actor))
    }

    pub fn mark_ready(&self, id: &str) -> DomainResult<Order> {
        self.advance(id, OrderEvent::MarkReady, None)
    }

    pub fn serve(&self, id: &str) -> DomainResult<Order> {
        self.advance(id, OrderEvent::Serve, None)
    }

    pub fn deliver(&self, id: &str) -> DomainResult<Order> {
        self.advance(id, OrderEvent::Deliver, None)
    }

    /// Customers cancel their own orders; admins any order
    pub fn cancel(
        &self,
        actor: &Actor,
        id: &str,
        reason: Option<String>,
    ) -> DomainResult<OrderCancellation> {
        self.store.write(|txn| {
            let order = require_order(txn, id)?;
            actor.ensure_owner(&order.customer_id, "order")?;
            let reason = reason
                .as_deref()
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .unwrap_or(DEFAULT_CANCEL_REASON);
            let cancellation = cancel_in_txn(txn, order, reason)?;
            recalculate_counts(txn)?;
            Ok(cancellation)
        })
    }

    pub fn get(&self, id: &str) -> DomainResult<Order> {
        self.store
            .get(id)?
            .ok_or_else(|| DomainError::not_found("Order", id))
    }

    /// Newest first
    pub fn list(&self, status: Option<OrderStatus>) -> DomainResult<Vec<Order>> {
        self.filtered(|o| status.is_none_or(|s| o.status == s))
    }

    pub fn list_by_customer(&self, customer_id: &str) -> DomainResult<Vec<Order>> {
        self.filtered(|o| o.customer_id == customer_id)
    }

    pub fn list_by_booking(&self, booking_id: &str) -> DomainResult<Vec<Order>> {
        self.filtered(|o| o.booking_id.as_deref() == Some(booking_id))
    }

    /// PENDING / ACCEPTED orders nobody holds, oldest first
    pub fn queue(&self) -> DomainResult<Vec<Order>> {
        let mut queued = self.filtered(|o| {
            matches!(o.status, OrderStatus::Pending | OrderStatus::Accepted) && o.is_queued()
        })?;
        queued.reverse();
        Ok(queued)
    }

    fn filtered(&self, keep: impl Fn(&Order) -> bool) -> DomainResult<Vec<Order>> {
        let mut orders: Vec<Order> = self
            .store
            .list::<Order>()?
            .into_iter()
            .filter(|o| keep(o))
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }
}
