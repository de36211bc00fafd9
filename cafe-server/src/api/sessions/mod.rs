//! Customer Sessions API 模块
//!
//! 顾客当前所处阶段，供前台与服务员查看。

mod handler;

use axum::{Router, middleware, routing::get};

use crate::auth::require_permission;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/sessions", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list))
        .route("/{customer_id}", get(handler::get))
        .layer(middleware::from_fn(require_permission("bookings:read")))
}
