//! Booking API 模块
//!
//! | 路径 | 方法 | 权限 |
//! |------|------|------|
//! | /api/bookings | POST | bookings:create |
//! | /api/bookings | GET | bookings:read |
//! | /api/bookings/mine | GET | 登录即可 |
//! | /api/bookings/{id} | GET | bookings:read 或本人 |
//! | /api/bookings/{id}/orders | GET | orders:read 或本人 |
//! | /api/bookings/{id}/cancel | POST | 本人或 admin |
//! | /api/bookings/{id}/approve 等 | POST | bookings:manage |

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::auth::require_permission;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/bookings", routes())
}

fn routes() -> Router<ServerState> {
    // 所有权检查在处理函数和服务内部完成
    let own_routes = Router::new()
        .route("/mine", get(handler::list_mine))
        .route("/{id}", get(handler::get_by_id))
        .route("/{id}/orders", get(handler::list_orders))
        .route("/{id}/cancel", post(handler::cancel));

    let create_routes = Router::new()
        .route("/", post(handler::create))
        .layer(middleware::from_fn(require_permission("bookings:create")));

    let read_routes = Router::new()
        .route("/", get(handler::list))
        .layer(middleware::from_fn(require_permission("bookings:read")));

    let manage_routes = Router::new()
        .route("/{id}/approve", post(handler::approve))
        .route("/{id}/reject", post(handler::reject))
        .route("/{id}/check-in", post(handler::check_in))
        .route("/{id}/served", post(handler::mark_served))
        .route("/{id}/no-show", post(handler::mark_no_show))
        .layer(middleware::from_fn(require_permission("bookings:manage")));

    own_routes
        .merge(create_routes)
        .merge(read_routes)
        .merge(manage_routes)
}
