//! Authentication Routes
//!
//! 注册与登录为公共接口 (见 `require_auth` 白名单)，`/me` 与 `/password` 需登录。

mod handler;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/auth", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/register", post(handler::register))
        .route("/login", post(handler::login))
        .route("/me", get(handler::me).put(handler::update_profile))
        .route("/password", put(handler::change_password))
}
