//! Staff API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use shared::models::{Order, StaffMember, StaffRole, StaffStatusChange, StaffStatusUpdate};
use validator::Validate;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::domain::Actor;
use crate::utils::{AppError, AppResult};

#[derive(Debug, Deserialize)]
pub struct AvailableQuery {
    pub role: Option<StaffRole>,
}

fn ensure_self_or(user: &CurrentUser, staff_id: &str, permission: &str) -> AppResult<()> {
    if user.id == staff_id || user.has_permission(permission) {
        Ok(())
    } else {
        Err(AppError::forbidden(format!("Permission denied: {}", permission)))
    }
}

/// GET /api/staff - 全部员工 (含工作量)
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<StaffMember>>> {
    Ok(Json(state.staff.list()?))
}

/// GET /api/staff/available?role=CHEF - 可接单员工，工作量少的在前
pub async fn list_available(
    State(state): State<ServerState>,
    Query(query): Query<AvailableQuery>,
) -> AppResult<Json<Vec<StaffMember>>> {
    Ok(Json(state.staff.available(query.role)?))
}

/// GET /api/staff/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<StaffMember>> {
    ensure_self_or(&user, &id, "staff:manage")?;
    Ok(Json(state.staff.get(&id)?))
}

/// GET /api/staff/{id}/orders - 当前指派给该员工的订单
pub async fn list_orders(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<Vec<Order>>> {
    ensure_self_or(&user, &id, "orders:assign")?;
    Ok(Json(state.staff.orders_of(&id)?))
}

/// PUT /api/staff/{id}/status
///
/// 切换为 UNAVAILABLE 时，其厨房阶段订单退回队列
pub async fn set_status(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(payload): Json<StaffStatusUpdate>,
) -> AppResult<Json<StaffStatusChange>> {
    payload.validate()?;
    let change = state
        .staff
        .set_status(&Actor::from(&user), &id, payload.status)?;
    Ok(Json(change))
}

/// POST /api/staff/{id}/release - 将该员工手上的订单退回队列
pub async fn release_orders(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<Vec<Order>>> {
    Ok(Json(state.staff.handle_staff_unavailable(&id)?))
}
