//! Staff assignment and reassignment
//!
//! Assignment is always explicit (admin picks the member); there is no
//! automatic load balancing. `assigned_orders_count` is derived and
//! recomputed in every transaction that moves an assignment.

use std::collections::HashMap;

use serde_json::json;
use shared::models::{
    NotificationKind, Order, OrderStatus, Recipient, StaffMember, StaffRole, StaffStatus,
    StaffStatusChange,
};

use crate::domain::{Actor, DomainError, DomainResult, short_id};
use crate::notifications::notify;
use crate::orders::machine::{OrderEvent, transition};
use crate::store::{Store, StoreResult, StoreTxn};

/// Recompute every member's count of PENDING / ACCEPTED / PREPARING orders
pub fn recalculate_counts(txn: &mut StoreTxn) -> StoreResult<()> {
    let mut counts: HashMap<String, u32> = HashMap::new();
    for order in txn.list::<Order>()? {
        if let Some(staff_id) = order.assigned_to
            && order.status.is_kitchen_stage()
        {
            *counts.entry(staff_id).or_default() += 1;
        }
    }

    for mut member in txn.list::<StaffMember>()? {
        let count = counts.get(&member.id).copied().unwrap_or(0);
        if member.assigned_orders_count != count {
            member.assigned_orders_count = count;
            member.updated_at = txn.now();
            txn.update(&mut member)?;
        }
    }
    Ok(())
}

/// Role an order's current stage needs
fn required_role(status: OrderStatus) -> Option<StaffRole> {
    match status {
        OrderStatus::Pending | OrderStatus::Accepted | OrderStatus::Preparing => {
            Some(StaffRole::Chef)
        }
        OrderStatus::Ready | OrderStatus::Served => Some(StaffRole::Waiter),
        OrderStatus::Delivered | OrderStatus::Cancelled => None,
    }
}

fn require_staff(txn: &StoreTxn, staff_id: &str) -> DomainResult<StaffMember> {
    txn.get(staff_id)?
        .ok_or_else(|| DomainError::not_found("Staff member", staff_id))
}

fn require_order(txn: &StoreTxn, order_id: &str) -> DomainResult<Order> {
    txn.get(order_id)?
        .ok_or_else(|| DomainError::not_found("Order", order_id))
}

fn ensure_can_take(member: &StaffMember, order: &Order) -> DomainResult<()> {
    if !member.is_available() {
        return Err(DomainError::BusinessRule(format!(
            "{} is not available",
            member.name
        )));
    }
    match required_role(order.status) {
        Some(role) if role == member.role => Ok(()),
        Some(role) => Err(DomainError::BusinessRule(format!(
            "Order {} in status {} needs a {}, {} is a {}",
            short_id(&order.id),
            order.status,
            role,
            member.name,
            member.role
        ))),
        None => Err(DomainError::invalid_transition(
            "order",
            order.status,
            OrderEvent::Assign.as_str(),
        )),
    }
}

/// Clear every kitchen-stage assignment held by `staff_id`.
///
/// PREPARING orders go back to PENDING; READY and later orders keep
/// their waiter.
pub(crate) fn release_assignments(txn: &mut StoreTxn, staff_id: &str) -> DomainResult<Vec<Order>> {
    let now = txn.now();
    let held: Vec<Order> = txn
        .list::<Order>()?
        .into_iter()
        .filter(|o| o.assigned_to.as_deref() == Some(staff_id) && o.status.is_kitchen_stage())
        .collect();

    let mut affected = Vec::with_capacity(held.len());
    for mut order in held {
        if order.status == OrderStatus::Preparing {
            order.status = transition(order.status, OrderEvent::Requeue)?;
            order.preparing_at = None;
        }
        order.assigned_to = None;
        order.assigned_staff_name = None;
        order.updated_at = now;
        txn.update(&mut order)?;

        notify(
            txn,
            Recipient::User(order.customer_id.clone()),
            NotificationKind::OrderDelayed,
            "⏳ Minor delay on your order",
            "A staff member became unavailable. Your order is back in queue and will be assigned to another staff member shortly.",
            json!({ "order_id": order.id }),
        )?;
        affected.push(order);
    }

    if !affected.is_empty() {
        tracing::info!(
            staff_id = %staff_id,
            orders = affected.len(),
            "Orders returned to queue"
        );
    }
    Ok(affected)
}

#[derive(Clone)]
pub struct StaffService {
    store: Store,
}

impl StaffService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub fn list(&self) -> DomainResult<Vec<StaffMember>> {
        let mut staff = self.store.list::<StaffMember>()?;
        staff.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(staff)
    }

    pub fn get(&self, id: &str) -> DomainResult<StaffMember> {
        self.store
            .get(id)?
            .ok_or_else(|| DomainError::not_found("Staff member", id))
    }

    /// Available members, least loaded first
    pub fn available(&self, role: Option<StaffRole>) -> DomainResult<Vec<StaffMember>> {
        let mut staff: Vec<StaffMember> = self
            .store
            .list::<StaffMember>()?
            .into_iter()
            .filter(|m| m.is_available() && role.is_none_or(|r| m.role == r))
            .collect();
        staff.sort_by(|a, b| {
            a.assigned_orders_count
                .cmp(&b.assigned_orders_count)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(staff)
    }

    /// Orders currently held by a member, oldest first
    pub fn orders_of(&self, staff_id: &str) -> DomainResult<Vec<Order>> {
        let mut orders: Vec<Order> = self
            .store
            .list::<Order>()?
            .into_iter()
            .filter(|o| o.assigned_to.as_deref() == Some(staff_id) && !o.status.is_terminal())
            .collect();
        orders.sort_by_key(|o| o.created_at);
        Ok(orders)
    }

    /// Toggle availability. Going UNAVAILABLE releases the member's kitchen
    /// orders in the same transaction.
    pub fn set_status(
        &self,
        actor: &Actor,
        staff_id: &str,
        status: StaffStatus,
    ) -> DomainResult<StaffStatusChange> {
        actor.ensure_owner(staff_id, "staff profile")?;

        self.store.write(|txn| {
            let mut member = require_staff(txn, staff_id)?;
            let affected_orders = if member.status != status {
                member.status = status;
                member.updated_at = txn.now();
                txn.update(&mut member)?;

                if status == StaffStatus::Unavailable {
                    let affected = release_assignments(txn, staff_id)?;
                    recalculate_counts(txn)?;
                    affected
                } else {
                    Vec::new()
                }
            } else {
                Vec::new()
            };

            // counts may have moved the member's version
            let staff = require_staff(txn, staff_id)?;
            tracing::info!(staff_id = %staff_id, status = ?status, "Staff status changed");
            Ok(StaffStatusChange {
                staff,
                affected_orders,
            })
        })
    }

    /// Return everything a member holds in the kitchen stages to the queue
    pub fn handle_staff_unavailable(&self, staff_id: &str) -> DomainResult<Vec<Order>> {
        self.store.write(|txn| {
            require_staff(txn, staff_id)?;
            let affected = release_assignments(txn, staff_id)?;
            recalculate_counts(txn)?;
            Ok(affected)
        })
    }

    /// Assign an order to a member. Kitchen-stage orders move to PREPARING.
    pub fn assign_order(&self, order_id: &str, staff_id: &str) -> DomainResult<Order> {
        self.store.write(|txn| {
            let mut order = require_order(txn, order_id)?;
            let member = require_staff(txn, staff_id)?;
            ensure_can_take(&member, &order)?;

            let now = txn.now();
            let next = transition(order.status, OrderEvent::Assign)?;
            if next == OrderStatus::Preparing && order.status != OrderStatus::Preparing {
                order.accepted_at.get_or_insert(now);
                order.preparing_at = Some(now);
            }
            order.status = next;
            order.assigned_to = Some(member.id.clone());
            order.assigned_staff_name = Some(member.name.clone());
            order.updated_at = now;
            txn.update(&mut order)?;
            recalculate_counts(txn)?;

            let (title, message) = match member.role {
                StaffRole::Chef => (
                    "🍳 Your order is being prepared!",
                    format!(
                        "Your order has been assigned to {} and is now being prepared.",
                        member.name
                    ),
                ),
                StaffRole::Waiter => (
                    "🛎️ Your order is on its way",
                    format!("{} will serve your order.", member.name),
                ),
            };
            notify(
                txn,
                Recipient::User(order.customer_id.clone()),
                NotificationKind::OrderAssigned,
                title,
                message,
                json!({ "order_id": order.id, "staff_id": member.id }),
            )?;
            notify(
                txn,
                Recipient::User(member.id.clone()),
                NotificationKind::OrderAssigned,
                "New order assigned",
                format!(
                    "Order #{} for table {} is assigned to you.",
                    short_id(&order.id),
                    order.table_number.as_deref().unwrap_or("-")
                ),
                json!({ "order_id": order.id }),
            )?;

            tracing::info!(order_id = %order.id, staff_id = %member.id, "Order assigned");
            Ok(order)
        })
    }

    /// Hand a PREPARING order to another chef
    pub fn reassign_order(&self, order_id: &str, staff_id: &str) -> DomainResult<Order> {
        self.store.write(|txn| {
            let mut order = require_order(txn, order_id)?;
            if order.status != OrderStatus::Preparing {
                return Err(DomainError::invalid_transition("order", order.status, "reassign"));
            }
            if order.assigned_to.as_deref() == Some(staff_id) {
                return Err(DomainError::Validation(
                    "Order is already assigned to this staff member".to_string(),
                ));
            }
            let member = require_staff(txn, staff_id)?;
            ensure_can_take(&member, &order)?;

            let previous = order.assigned_staff_name.clone();
            order.status = transition(order.status, OrderEvent::Assign)?;
            order.assigned_to = Some(member.id.clone());
            order.assigned_staff_name = Some(member.name.clone());
            order.updated_at = txn.now();
            txn.update(&mut order)?;
            recalculate_counts(txn)?;

            let message = match &previous {
                Some(previous) => format!(
                    "Your order has been reassigned from {} to {} and preparation continues.",
                    previous, member.name
                ),
                None => format!(
                    "Your order has been assigned to {} and preparation continues.",
                    member.name
                ),
            };
            notify(
                txn,
                Recipient::User(order.customer_id.clone()),
                NotificationKind::OrderAssigned,
                "🍳 Order resumed with new staff",
                message,
                json!({
                    "order_id": order.id,
                    "staff_id": member.id,
                    "previous_staff": previous,
                }),
            )?;

            tracing::info!(
                order_id = %order.id,
                staff_id = %member.id,
                previous = ?previous,
                "Order reassigned"
            );
            Ok(order)
        })
    }
}
