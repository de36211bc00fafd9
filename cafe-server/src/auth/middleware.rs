//! 认证中间件
//!
//! `require_auth` 在路由最外层解析 Bearer 令牌，`require_permission`
//! 在各路由组上按权限放行。

use std::future::Future;
use std::pin::Pin;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use http::{HeaderMap, Method, Uri};
use shared::models::Account;

use crate::AppError;
use crate::auth::{CurrentUser, JwtError, JwtService};
use crate::core::ServerState;
use crate::security_log;

/// 无需登录的 API 路由
const PUBLIC_API_ROUTES: &[&str] = &[
    "/api/auth/login",
    "/api/auth/register",
    "/api/invites/validate",
    "/api/invites/accept",
];

/// 是否跳过认证：CORS 预检、非 `/api/` 路径 (`/health`) 与公共接口
fn is_public(method: &Method, path: &str) -> bool {
    method == Method::OPTIONS || !path.starts_with("/api/") || PUBLIC_API_ROUTES.contains(&path)
}

/// 从 `Authorization: Bearer <token>` 解析当前用户
///
/// | 情况 | 错误 |
/// |------|------|
/// | 无 Authorization 头 | E3001 Unauthorized |
/// | 令牌过期 | E3003 TokenExpired |
/// | 格式错误 / 签名无效 / 未知角色 / 账户不存在 | E3002 InvalidToken |
/// | 账户已停用 | E2001 Forbidden |
pub(crate) fn authenticate(
    state: &ServerState,
    headers: &HeaderMap,
    uri: &Uri,
) -> Result<CurrentUser, AppError> {
    let Some(header) = headers
        .get(http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
    else {
        security_log!("WARN", "auth_missing", uri = uri.path());
        return Err(AppError::unauthorized());
    };

    let token = JwtService::extract_from_header(header)
        .ok_or_else(|| AppError::invalid_token("Invalid authorization header"))?;

    let user = state
        .jwt_service
        .validate_token(token)
        .and_then(CurrentUser::try_from)
        .map_err(|e| {
            security_log!(
                "WARN",
                "auth_failed",
                error = e.to_string(),
                uri = uri.path()
            );
            match e {
                JwtError::ExpiredToken => AppError::token_expired(),
                _ => AppError::invalid_token("Invalid token"),
            }
        })?;

    // 令牌在有效期内，但账户可能已被删除或停用
    match state.store.get::<Account>(&user.id)? {
        Some(account) if account.is_active => Ok(user),
        Some(_) => {
            security_log!("WARN", "auth_disabled", account_id = user.id.clone());
            Err(AppError::forbidden("Account has been disabled"))
        }
        None => Err(AppError::invalid_token("Unknown account")),
    }
}

/// 认证中间件 - 要求用户登录
///
/// 验证成功后将 [`CurrentUser`] 注入请求扩展，处理函数通过提取器取用。
pub async fn require_auth(
    State(state): State<ServerState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    if is_public(req.method(), req.uri().path()) {
        return Ok(next.run(req).await);
    }

    let user = authenticate(&state, req.headers(), req.uri())?;
    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

type PermissionFuture = Pin<Box<dyn Future<Output = Result<Response, AppError>> + Send>>;

/// 权限检查中间件 - 要求特定权限
///
/// ```ignore
/// Router::new()
///     .route("/{id}/approve", post(handler::approve))
///     .layer(middleware::from_fn(require_permission("bookings:manage")));
/// ```
///
/// 无权限返回 403 Forbidden
pub fn require_permission(
    permission: &'static str,
) -> impl Fn(Request, Next) -> PermissionFuture + Clone {
    move |req: Request, next: Next| {
        Box::pin(async move {
            let user = req
                .extensions()
                .get::<CurrentUser>()
                .ok_or(AppError::unauthorized())?;

            if !user.has_permission(permission) {
                security_log!(
                    "WARN",
                    "permission_denied",
                    user_id = user.id.clone(),
                    role = user.role.as_str(),
                    required_permission = permission
                );
                return Err(AppError::forbidden(format!(
                    "Permission denied: {}",
                    permission
                )));
            }

            Ok(next.run(req).await)
        })
    }
}
