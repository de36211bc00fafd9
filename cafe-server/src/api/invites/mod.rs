//! Staff Invite API 模块
//!
//! 校验与接受邀请为公共接口 (见 `require_auth` 白名单)，其余需 `staff:manage`。

mod handler;

use axum::{
    Router, middleware,
    routing::{delete, get, post},
};

use crate::auth::require_permission;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/invites", routes())
}

fn routes() -> Router<ServerState> {
    let public_routes = Router::new()
        .route("/validate", get(handler::validate))
        .route("/accept", post(handler::accept));

    let manage_routes = Router::new()
        .route("/", post(handler::create).get(handler::list))
        .route("/stats", get(handler::stats))
        .route("/{id}/revoke", post(handler::revoke))
        .route("/{id}", delete(handler::delete))
        .layer(middleware::from_fn(require_permission("staff:manage")));

    public_routes.merge(manage_routes)
}
