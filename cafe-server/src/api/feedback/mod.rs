//! Feedback API 模块

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post, put},
};

use crate::auth::require_permission;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/feedback", routes())
}

fn routes() -> Router<ServerState> {
    // admin 看到全部评价，其余账户只看自己的
    let own_routes = Router::new().route("/", get(handler::list));

    let create_routes = Router::new()
        .route("/", post(handler::submit))
        .layer(middleware::from_fn(require_permission("feedback:create")));

    let manage_routes = Router::new()
        .route("/stats", get(handler::stats))
        .route("/{id}/respond", post(handler::respond))
        .route("/{id}/status", put(handler::set_status))
        .route("/{id}", axum::routing::delete(handler::delete))
        .layer(middleware::from_fn(require_permission("feedback:manage")));

    own_routes.merge(create_routes).merge(manage_routes)
}
