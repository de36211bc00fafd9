//! Staff API 模块

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post, put},
};

use crate::auth::require_permission;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/staff", routes())
}

fn routes() -> Router<ServerState> {
    // 员工查看 / 切换自己的状态，admin 可操作任何人
    let own_routes = Router::new()
        .route("/{id}", get(handler::get_by_id))
        .route("/{id}/orders", get(handler::list_orders))
        .route("/{id}/status", put(handler::set_status));

    let assign_routes = Router::new()
        .route("/available", get(handler::list_available))
        .layer(middleware::from_fn(require_permission("orders:assign")));

    let manage_routes = Router::new()
        .route("/", get(handler::list))
        .route("/{id}/release", post(handler::release_orders))
        .layer(middleware::from_fn(require_permission("staff:manage")));

    own_routes.merge(assign_routes).merge(manage_routes)
}
