//! Sync API 模块
//!
//! 客户端断线重连或总线落后时，从变更日志补齐缺失的记录。

mod handler;

use axum::{Router, middleware, routing::get};

use crate::auth::require_permission;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/sync", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/changes", get(handler::changes))
        .layer(middleware::from_fn(require_permission("sync:read")))
}
