//! Payment API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use shared::models::{PaymentCreate, PaymentTransaction, RefundRequest};
use validator::Validate;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::domain::Actor;
use crate::utils::{AppError, AppResult};

/// POST /api/payments - 为已有订单付款
pub async fn record(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<PaymentCreate>,
) -> AppResult<Json<PaymentTransaction>> {
    payload.validate()?;
    Ok(Json(state.payments.record(&Actor::from(&user), payload)?))
}

/// GET /api/payments/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<PaymentTransaction>> {
    let payment = state.payments.get(&id)?;
    if !user.has_permission("payments:manage") && !user.can_access(&payment.customer_id) {
        return Err(AppError::forbidden(format!(
            "Payment {} belongs to another account",
            payment.id
        )));
    }
    Ok(Json(payment))
}

/// GET /api/payments/refunds/pending
pub async fn pending_refunds(
    State(state): State<ServerState>,
) -> AppResult<Json<Vec<PaymentTransaction>>> {
    Ok(Json(state.payments.pending_refunds()?))
}

/// POST /api/payments/{id}/refund
pub async fn initiate_refund(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<RefundRequest>,
) -> AppResult<Json<PaymentTransaction>> {
    payload.validate()?;
    Ok(Json(state.payments.initiate_refund(&id, &payload.reason)?))
}

/// POST /api/payments/{id}/refund/complete
pub async fn complete_refund(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<PaymentTransaction>> {
    Ok(Json(state.payments.complete_refund(&id)?))
}
