//! API 路由模块
//!
//! # 结构
//!
//! - [`health`] - 健康检查
//! - [`auth`] - 注册、登录、当前用户、资料与密码
//! - [`accounts`] - 账户管理 (启用 / 停用)
//! - [`bookings`] - 预订生命周期
//! - [`orders`] - 订单生命周期、厨房队列、指派
//! - [`staff`] - 员工状态与工作量
//! - [`invites`] - 员工邀请
//! - [`tables`] - 桌台、使用记录、优先级队列
//! - [`payments`] - 支付与退款
//! - [`notifications`] - 站内通知
//! - [`feedback`] - 顾客评价
//! - [`sessions`] - 顾客实时状态
//! - [`sync`] - 变更日志拉取

pub mod accounts;
pub mod auth;
pub mod bookings;
pub mod feedback;
pub mod health;
pub mod invites;
pub mod notifications;
pub mod orders;
pub mod payments;
pub mod sessions;
pub mod staff;
pub mod sync;
pub mod tables;

mod logging;

use axum::Router;
use axum::middleware;
use http::{HeaderName, HeaderValue};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::auth::require_auth;
use crate::core::ServerState;

// Re-export common types for handlers
pub use crate::utils::{AppResponse, AppResult};

const REQUEST_ID_HEADER: &str = "x-request-id";

/// 请求 ID 生成器 (UUID v4)
#[derive(Clone)]
struct XRequestId;

impl MakeRequestId for XRequestId {
    fn make_request_id<B>(&mut self, _request: &http::Request<B>) -> Option<RequestId> {
        let id = uuid::Uuid::new_v4().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// 注册所有路由 (无中间件、无状态)
pub fn routes() -> Router<ServerState> {
    Router::new()
        .merge(health::router())
        .merge(auth::router())
        .merge(accounts::router())
        .merge(bookings::router())
        .merge(orders::router())
        .merge(staff::router())
        .merge(invites::router())
        .merge(tables::router())
        .merge(payments::router())
        .merge(notifications::router())
        .merge(feedback::router())
        .merge(sessions::router())
        .merge(sync::router())
}

/// 构建完整应用：路由 + 中间件 + 状态
pub fn build_router(state: ServerState) -> Router {
    routes()
        // ========== Tower HTTP Middleware ==========
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        // Request logging - runs after authentication so the user is known
        .layer(middleware::from_fn(logging::logging_middleware))
        .layer(TraceLayer::new_for_http())
        // ========== Application Middleware ==========
        .layer(SetRequestIdLayer::new(
            HeaderName::from_static(REQUEST_ID_HEADER),
            XRequestId,
        ))
        .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
            REQUEST_ID_HEADER,
        )))
        // JWT 认证 - 最外层，注入 CurrentUser
        .layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .with_state(state)
}
