//! Authentication Handlers
//!
//! Registration, login and the current account

use std::time::Duration;

use axum::{Json, extract::State};
use chrono::Utc;
use shared::models::{
    Account, AccountInfo, LoginRequest, LoginResponse, PasswordChange, ProfileUpdate,
    RegisterRequest,
};
use validator::Validate;

use crate::accounts::service::normalize_email;
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::domain::{Actor, DomainError};
use crate::security_log;
use crate::utils::{AppError, AppResult};

/// Fixed delay for authentication to prevent timing attacks
const AUTH_FIXED_DELAY_MS: u64 = 500;

fn issue_token(state: &ServerState, account: &Account) -> AppResult<LoginResponse> {
    let token = state
        .jwt_service
        .generate_token(account)
        .map_err(|e| AppError::internal(format!("Failed to generate token: {}", e)))?;
    Ok(LoginResponse {
        token,
        user: AccountInfo::from(account),
    })
}

/// POST /api/auth/register - 顾客自助注册，注册成功即登录
pub async fn register(
    State(state): State<ServerState>,
    Json(req): Json<RegisterRequest>,
) -> AppResult<Json<LoginResponse>> {
    req.validate()?;
    let account = state.accounts.register(req)?;
    Ok(Json(issue_token(&state, &account)?))
}

/// POST /api/auth/login
///
/// Unknown email and wrong password return the same error. Repeated
/// failures lock the email for a while.
pub async fn login(
    State(state): State<ServerState>,
    Json(req): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    req.validate()?;
    let email = normalize_email(&req.email);

    if state.login_throttle.is_locked(&email, Utc::now()) {
        security_log!("WARN", "login_locked", email = email.clone());
        return Err(AppError::forbidden(
            "Too many failed login attempts, try again later",
        ));
    }

    let result = state.accounts.authenticate(&email, &req.password);

    // Fixed delay to prevent timing attacks (before checking result)
    tokio::time::sleep(Duration::from_millis(AUTH_FIXED_DELAY_MS)).await;

    let account = match result {
        Ok(account) => account,
        Err(DomainError::InvalidCredentials) => {
            let attempts = state.login_throttle.record_failure(&email, Utc::now());
            security_log!(
                "WARN",
                "login_failed",
                email = email.clone(),
                attempts = attempts
            );
            return Err(AppError::invalid_credentials());
        }
        Err(e) => return Err(e.into()),
    };

    state.login_throttle.reset(&email);
    tracing::info!(
        account_id = %account.id,
        role = %account.role.as_str(),
        "User logged in successfully"
    );

    Ok(Json(issue_token(&state, &account)?))
}

/// GET /api/auth/me
pub async fn me(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<Json<AccountInfo>> {
    let account = state.accounts.get(&user.id)?;
    Ok(Json(AccountInfo::from(&account)))
}

/// PUT /api/auth/me - 修改姓名 / 电话 (邮箱不可改)
pub async fn update_profile(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<ProfileUpdate>,
) -> AppResult<Json<AccountInfo>> {
    payload.validate()?;
    let account = state.accounts.update_profile(&Actor::from(&user), payload)?;
    Ok(Json(AccountInfo::from(&account)))
}

/// PUT /api/auth/password - 需要提供当前密码，已签发的令牌继续有效
pub async fn change_password(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<PasswordChange>,
) -> AppResult<Json<AccountInfo>> {
    payload.validate()?;
    state.accounts.change_password(&Actor::from(&user), payload)?;
    let account = state.accounts.get(&user.id)?;
    Ok(Json(AccountInfo::from(&account)))
}
