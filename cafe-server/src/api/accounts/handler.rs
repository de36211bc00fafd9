//! Accounts API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use shared::models::{AccountInfo, AccountStatusUpdate};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::domain::Actor;
use crate::utils::AppResult;

/// GET /api/accounts - 最新注册在前
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<AccountInfo>>> {
    let accounts = state.accounts.list()?;
    Ok(Json(accounts.iter().map(AccountInfo::from).collect()))
}

/// PUT /api/accounts/{id}/status
///
/// 停用后该账户无法登录，已签发的令牌也随即失效；
/// 员工账户同时下班并释放手上的订单。
pub async fn set_status(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(payload): Json<AccountStatusUpdate>,
) -> AppResult<Json<AccountInfo>> {
    let account = state
        .accounts
        .set_active(&Actor::from(&user), &id, payload.is_active)?;
    Ok(Json(AccountInfo::from(&account)))
}
