//! Staff Invite API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use shared::models::{
    InviteAccept, InviteCreate, InviteCreated, InviteStats, InviteValidation, StaffInvite,
    StaffMember,
};
use validator::Validate;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::domain::Actor;
use crate::utils::AppResult;

#[derive(Debug, Deserialize)]
pub struct ValidateQuery {
    pub token: String,
}

/// POST /api/invites - 生成邀请，令牌只在此返回一次
pub async fn create(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<InviteCreate>,
) -> AppResult<Json<InviteCreated>> {
    payload.validate()?;
    Ok(Json(state.invites.create(&Actor::from(&user), payload)?))
}

/// GET /api/invites
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<StaffInvite>>> {
    Ok(Json(state.invites.list()?))
}

/// GET /api/invites/stats
pub async fn stats(State(state): State<ServerState>) -> AppResult<Json<InviteStats>> {
    Ok(Json(state.invites.stats()?))
}

/// GET /api/invites/validate?token=...
///
/// 无效令牌返回 `valid: false` 和原因，不返回错误码
pub async fn validate(
    State(state): State<ServerState>,
    Query(query): Query<ValidateQuery>,
) -> AppResult<Json<InviteValidation>> {
    Ok(Json(state.invites.validate(&query.token)?))
}

/// POST /api/invites/accept - 创建员工账户
pub async fn accept(
    State(state): State<ServerState>,
    Json(payload): Json<InviteAccept>,
) -> AppResult<Json<StaffMember>> {
    payload.validate()?;
    Ok(Json(state.invites.accept(payload)?))
}

/// POST /api/invites/{id}/revoke
pub async fn revoke(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<StaffInvite>> {
    Ok(Json(state.invites.revoke(&id)?))
}

/// DELETE /api/invites/{id}
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<StaffInvite>> {
    Ok(Json(state.invites.delete(&id)?))
}
