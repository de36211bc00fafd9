//! Dining Table API 模块

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::auth::require_permission;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/tables", routes())
}

fn routes() -> Router<ServerState> {
    // 顾客预订时需要浏览桌台：登录即可
    let browse_routes = Router::new()
        .route("/", get(handler::list))
        .route("/{id}", get(handler::get_by_id));

    let read_routes = Router::new()
        .route("/assignments", get(handler::assignments))
        .route("/priority-queue", get(handler::priority_queue))
        .route("/{id}/history", get(handler::history))
        .layer(middleware::from_fn(require_permission("tables:read")));

    let suggest_routes = Router::new()
        .route("/suggest", get(handler::suggest))
        .layer(middleware::from_fn(require_permission("bookings:manage")));

    let manage_routes = Router::new()
        .route("/", post(handler::create))
        .layer(middleware::from_fn(require_permission("tables:manage")));

    browse_routes
        .merge(read_routes)
        .merge(suggest_routes)
        .merge(manage_routes)
}
