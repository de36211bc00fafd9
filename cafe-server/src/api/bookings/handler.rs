//! Booking API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use shared::models::{
    Booking, BookingApprove, BookingCancel, BookingCancellation, BookingCreate, BookingReject,
    BookingStatus, Order,
};
use validator::Validate;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::domain::Actor;
use crate::utils::{AppError, AppResult};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<BookingStatus>,
}

fn ensure_visible(user: &CurrentUser, booking: &Booking, permission: &str) -> AppResult<()> {
    if user.has_permission(permission) || user.can_access(&booking.customer_id) {
        Ok(())
    } else {
        Err(AppError::forbidden(format!(
            "Booking {} belongs to another account",
            booking.id
        )))
    }
}

/// POST /api/bookings - 提交预订 (桌台空闲时直接确认)
pub async fn create(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<BookingCreate>,
) -> AppResult<Json<Booking>> {
    payload.validate()?;
    let booking = state.bookings.create(&Actor::from(&user), payload)?;
    Ok(Json(booking))
}

/// GET /api/bookings?status=PENDING
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<Booking>>> {
    Ok(Json(state.bookings.list(query.status)?))
}

/// GET /api/bookings/mine
pub async fn list_mine(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<Json<Vec<Booking>>> {
    Ok(Json(state.bookings.list_by_customer(&user.id)?))
}

/// GET /api/bookings/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<Booking>> {
    let booking = state.bookings.get(&id)?;
    ensure_visible(&user, &booking, "bookings:read")?;
    Ok(Json(booking))
}

/// GET /api/bookings/{id}/orders
pub async fn list_orders(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<Vec<Order>>> {
    let booking = state.bookings.get(&id)?;
    ensure_visible(&user, &booking, "orders:read")?;
    Ok(Json(state.orders.list_by_booking(&id)?))
}

/// POST /api/bookings/{id}/approve
pub async fn approve(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    payload: Option<Json<BookingApprove>>,
) -> AppResult<Json<Booking>> {
    let payload = payload.map(|Json(p)| p).unwrap_or_default();
    payload.validate()?;
    Ok(Json(state.bookings.approve(&id, payload.note)?))
}

/// POST /api/bookings/{id}/reject - 拒绝原因必填
pub async fn reject(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<BookingReject>,
) -> AppResult<Json<Booking>> {
    payload.validate()?;
    Ok(Json(state.bookings.reject(&id, &payload.reason)?))
}

/// POST /api/bookings/{id}/cancel - 级联取消订单并标记退款
pub async fn cancel(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
    payload: Option<Json<BookingCancel>>,
) -> AppResult<Json<BookingCancellation>> {
    let payload = payload.map(|Json(p)| p).unwrap_or_default();
    payload.validate()?;
    let cancellation = state
        .bookings
        .cancel(&Actor::from(&user), &id, payload.reason)?;
    Ok(Json(cancellation))
}

/// POST /api/bookings/{id}/check-in
pub async fn check_in(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<Booking>> {
    Ok(Json(state.bookings.check_in(&id)?))
}

/// POST /api/bookings/{id}/served
pub async fn mark_served(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<Booking>> {
    Ok(Json(state.bookings.mark_served(&id)?))
}

/// POST /api/bookings/{id}/no-show
pub async fn mark_no_show(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<Booking>> {
    Ok(Json(state.bookings.mark_no_show(&id)?))
}
