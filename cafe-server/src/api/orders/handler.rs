//! Order API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use shared::models::{Order, OrderAssign, OrderCancel, OrderCancellation, OrderCreate, OrderStatus};
use validator::Validate;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::domain::Actor;
use crate::utils::{AppError, AppResult};

/// Query params for listing orders
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<OrderStatus>,
}

/// POST /api/orders - 结账下单 (可同时支付)
pub async fn create(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<OrderCreate>,
) -> AppResult<Json<Order>> {
    payload.validate()?;
    let order = state.orders.create(&Actor::from(&user), payload)?;
    Ok(Json(order))
}

/// GET /api/orders?status=PREPARING
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<Order>>> {
    Ok(Json(state.orders.list(query.status)?))
}

/// GET /api/orders/mine
pub async fn list_mine(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<Json<Vec<Order>>> {
    Ok(Json(state.orders.list_by_customer(&user.id)?))
}

/// GET /api/orders/queue - 待接单且未指派，最早的在前
pub async fn queue(State(state): State<ServerState>) -> AppResult<Json<Vec<Order>>> {
    Ok(Json(state.orders.queue()?))
}

/// GET /api/orders/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<Order>> {
    let order = state.orders.get(&id)?;
    if !user.has_permission("orders:read") && !user.can_access(&order.customer_id) {
        return Err(AppError::forbidden(format!(
            "Order {} belongs to another account",
            order.id
        )));
    }
    Ok(Json(order))
}

/// POST /api/orders/{id}/accept
pub async fn accept(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<Order>> {
    Ok(Json(state.orders.accept(&id)?))
}

/// POST /api/orders/{id}/start - 厨师开始制作未指派订单时自动领取
pub async fn start_preparing(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<Order>> {
    Ok(Json(state.orders.start_preparing(&Actor::from(&user), &id)?))
}

/// POST /api/orders/{id}/ready
pub async fn mark_ready(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<Order>> {
    Ok(Json(state.orders.mark_ready(&id)?))
}

/// POST /api/orders/{id}/serve
pub async fn serve(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<Order>> {
    Ok(Json(state.orders.serve(&id)?))
}

/// POST /api/orders/{id}/deliver
pub async fn deliver(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<Order>> {
    Ok(Json(state.orders.deliver(&id)?))
}

/// POST /api/orders/{id}/cancel - 已支付订单转为待退款
pub async fn cancel(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
    payload: Option<Json<OrderCancel>>,
) -> AppResult<Json<OrderCancellation>> {
    let payload = payload.map(|Json(p)| p).unwrap_or_default();
    payload.validate()?;
    let cancellation = state
        .orders
        .cancel(&Actor::from(&user), &id, payload.reason)?;
    Ok(Json(cancellation))
}

/// POST /api/orders/{id}/assign
pub async fn assign(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<OrderAssign>,
) -> AppResult<Json<Order>> {
    payload.validate()?;
    Ok(Json(state.staff.assign_order(&id, &payload.staff_id)?))
}

/// POST /api/orders/{id}/reassign
pub async fn reassign(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<OrderAssign>,
) -> AppResult<Json<Order>> {
    payload.validate()?;
    Ok(Json(state.staff.reassign_order(&id, &payload.staff_id)?))
}
