//! Payment API 模块

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::auth::require_permission;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/payments", routes())
}

fn routes() -> Router<ServerState> {
    let own_routes = Router::new().route("/{id}", get(handler::get_by_id));

    let pay_routes = Router::new()
        .route("/", post(handler::record))
        .layer(middleware::from_fn(require_permission("orders:create")));

    // 退款处理
    let manage_routes = Router::new()
        .route("/refunds/pending", get(handler::pending_refunds))
        .route("/{id}/refund", post(handler::initiate_refund))
        .route("/{id}/refund/complete", post(handler::complete_refund))
        .layer(middleware::from_fn(require_permission("payments:manage")));

    own_routes.merge(pay_routes).merge(manage_routes)
}
