//! Order API 模块
//!
//! 顾客下单与取消，厨房按阶段推进，管理员指派。

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::auth::require_permission;
use crate::core::ServerState;

/// Order router
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/orders", routes())
}

fn routes() -> Router<ServerState> {
    // 本人订单：登录即可，所有权在服务内检查
    let own_routes = Router::new()
        .route("/mine", get(handler::list_mine))
        .route("/{id}", get(handler::get_by_id))
        .route("/{id}/cancel", post(handler::cancel));

    let create_routes = Router::new()
        .route("/", post(handler::create))
        .layer(middleware::from_fn(require_permission("orders:create")));

    let read_routes = Router::new()
        .route("/", get(handler::list))
        .route("/queue", get(handler::queue))
        .layer(middleware::from_fn(require_permission("orders:read")));

    // Kitchen stages
    let prepare_routes = Router::new()
        .route("/{id}/accept", post(handler::accept))
        .route("/{id}/start", post(handler::start_preparing))
        .route("/{id}/ready", post(handler::mark_ready))
        .layer(middleware::from_fn(require_permission("orders:prepare")));

    let serve_routes = Router::new()
        .route("/{id}/serve", post(handler::serve))
        .route("/{id}/deliver", post(handler::deliver))
        .layer(middleware::from_fn(require_permission("orders:serve")));

    let assign_routes = Router::new()
        .route("/{id}/assign", post(handler::assign))
        .route("/{id}/reassign", post(handler::reassign))
        .layer(middleware::from_fn(require_permission("orders:assign")));

    own_routes
        .merge(create_routes)
        .merge(read_routes)
        .merge(prepare_routes)
        .merge(serve_routes)
        .merge(assign_routes)
}
