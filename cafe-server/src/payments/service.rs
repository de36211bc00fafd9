use serde_json::json;
use shared::models::{
    NotificationKind, Order, OrderStatus, PaymentCreate, PaymentStatus, PaymentTransaction,
    Recipient, TransactionStatus,
};

use crate::domain::{Actor, DomainError, DomainResult, new_id};
use crate::notifications::notify;
use crate::store::{Store, StoreResult, StoreTxn};

fn transaction_reference() -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    format!("TXN-{}", id[..8].to_uppercase())
}

/// Record a PAID transaction for an order (the order itself is not touched)
pub(crate) fn record_payment(
    txn: &mut StoreTxn,
    order: &Order,
    payment_mode: &str,
) -> StoreResult<PaymentTransaction> {
    let now = txn.now();
    let mut payment = PaymentTransaction {
        id: new_id(),
        version: 0,
        transaction_id: transaction_reference(),
        customer_id: order.customer_id.clone(),
        customer_name: order.customer_name.clone(),
        booking_id: order.booking_id.clone(),
        order_id: Some(order.id.clone()),
        amount: order.total,
        payment_mode: payment_mode.to_uppercase(),
        status: TransactionStatus::Paid,
        refund_reason: None,
        created_at: now,
        updated_at: now,
        refund_requested_at: None,
        refunded_at: None,
    };
    txn.insert(&mut payment)?;

    notify(
        txn,
        Recipient::User(order.customer_id.clone()),
        NotificationKind::Info,
        "✅ Payment Successful",
        format!(
            "Payment of ${:.2} completed via {}. Transaction ID: {}",
            payment.amount, payment.payment_mode, payment.transaction_id
        ),
        json!({ "payment_id": payment.id, "order_id": order.id }),
    )?;
    tracing::info!(
        payment_id = %payment.id,
        order_id = %order.id,
        amount = payment.amount,
        "Payment recorded"
    );
    Ok(payment)
}

/// Flip a PAID transaction to PENDING_REFUND.
///
/// Returns `false` without writing when the payment is not PAID, so a
/// payment is flagged at most once.
pub(crate) fn flag_refund(
    txn: &mut StoreTxn,
    payment: &mut PaymentTransaction,
    reason: &str,
) -> StoreResult<bool> {
    if payment.status != TransactionStatus::Paid {
        return Ok(false);
    }
    let now = txn.now();
    payment.status = TransactionStatus::PendingRefund;
    payment.refund_reason = Some(reason.to_string());
    payment.refund_requested_at = Some(now);
    payment.updated_at = now;
    txn.update(payment)?;

    notify(
        txn,
        Recipient::User(payment.customer_id.clone()),
        NotificationKind::RefundInitiated,
        "💰 Refund Initiated",
        format!(
            "Your payment of ${:.2} is under refund process. You will be notified once completed.",
            payment.amount
        ),
        json!({ "payment_id": payment.id, "reason": reason }),
    )?;
    notify(
        txn,
        Recipient::Admin,
        NotificationKind::RefundInitiated,
        "Refund pending",
        format!(
            "Refund of ${:.2} requested for {} ({})",
            payment.amount, payment.customer_name, payment.transaction_id
        ),
        json!({ "payment_id": payment.id, "reason": reason }),
    )?;
    tracing::info!(payment_id = %payment.id, reason = %reason, "Payment flagged for refund");
    Ok(true)
}

/// Set the order-side payment status of the order a payment belongs to
fn sync_order_payment_status(
    txn: &mut StoreTxn,
    payment: &PaymentTransaction,
    status: PaymentStatus,
) -> StoreResult<()> {
    let Some(order_id) = payment.order_id.as_deref() else {
        return Ok(());
    };
    if let Some(mut order) = txn.get::<Order>(order_id)?
        && order.payment_status != status
    {
        order.payment_status = status;
        order.updated_at = txn.now();
        txn.update(&mut order)?;
    }
    Ok(())
}

#[derive(Clone)]
pub struct PaymentService {
    store: Store,
}

impl PaymentService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub fn get(&self, id: &str) -> DomainResult<PaymentTransaction> {
        self.store
            .get(id)?
            .ok_or_else(|| DomainError::not_found("Payment", id))
    }

    /// Pay an existing unpaid order
    pub fn record(&self, actor: &Actor, data: PaymentCreate) -> DomainResult<PaymentTransaction> {
        self.store.write(|txn| {
            let mut order: Order = txn
                .get(&data.order_id)?
                .ok_or_else(|| DomainError::not_found("Order", &data.order_id))?;
            actor.ensure_owner(&order.customer_id, "order")?;

            if order.status == OrderStatus::Cancelled {
                return Err(DomainError::BusinessRule(
                    "Cannot pay for a cancelled order".to_string(),
                ));
            }
            if order.payment_status != PaymentStatus::Unpaid {
                return Err(DomainError::Conflict(format!(
                    "Order {} is already paid",
                    order.id
                )));
            }

            let payment = record_payment(txn, &order, &data.payment_mode)?;
            order.payment_status = PaymentStatus::Paid;
            order.payment_id = Some(payment.id.clone());
            order.updated_at = txn.now();
            txn.update(&mut order)?;
            Ok(payment)
        })
    }

    /// Admin-initiated refund of a PAID transaction
    pub fn initiate_refund(&self, id: &str, reason: &str) -> DomainResult<PaymentTransaction> {
        self.store.write(|txn| {
            let mut payment: PaymentTransaction = txn
                .get(id)?
                .ok_or_else(|| DomainError::not_found("Payment", id))?;
            if !flag_refund(txn, &mut payment, reason)? {
                return Err(DomainError::BusinessRule(format!(
                    "Payment {} cannot be refunded in status {:?}",
                    payment.transaction_id, payment.status
                )));
            }
            sync_order_payment_status(txn, &payment, PaymentStatus::RefundPending)?;
            Ok(payment)
        })
    }

    /// PENDING_REFUND → REFUNDED
    pub fn complete_refund(&self, id: &str) -> DomainResult<PaymentTransaction> {
        self.store.write(|txn| {
            let mut payment: PaymentTransaction = txn
                .get(id)?
                .ok_or_else(|| DomainError::not_found("Payment", id))?;
            if payment.status != TransactionStatus::PendingRefund {
                return Err(DomainError::BusinessRule(format!(
                    "Payment {} has no pending refund",
                    payment.transaction_id
                )));
            }

            let now = txn.now();
            payment.status = TransactionStatus::Refunded;
            payment.refunded_at = Some(now);
            payment.updated_at = now;
            txn.update(&mut payment)?;
            sync_order_payment_status(txn, &payment, PaymentStatus::Refunded)?;

            notify(
                txn,
                Recipient::User(payment.customer_id.clone()),
                NotificationKind::RefundCompleted,
                "✅ Refund Completed",
                format!(
                    "Your refund of ${:.2} has been processed successfully. Transaction ID: {}",
                    payment.amount, payment.transaction_id
                ),
                json!({ "payment_id": payment.id }),
            )?;
            tracing::info!(payment_id = %payment.id, "Refund completed");
            Ok(payment)
        })
    }

    /// Oldest request first
    pub fn pending_refunds(&self) -> DomainResult<Vec<PaymentTransaction>> {
        let mut pending: Vec<PaymentTransaction> = self
            .store
            .list::<PaymentTransaction>()?
            .into_iter()
            .filter(|p| p.status == TransactionStatus::PendingRefund)
            .collect();
        pending.sort_by_key(|p| p.refund_requested_at);
        Ok(pending)
    }
}
