//! Notification API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;
use shared::models::{Notification, UnreadCount};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::domain::Actor;
use crate::utils::AppResult;

#[derive(Debug, Serialize)]
pub struct MarkAllReadResponse {
    pub updated: u32,
}

/// GET /api/notifications - 最新的在前
pub async fn list(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<Json<Vec<Notification>>> {
    Ok(Json(state.notifications.list(&Actor::from(&user))?))
}

/// GET /api/notifications/unread-count
pub async fn unread_count(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<Json<UnreadCount>> {
    Ok(Json(state.notifications.unread_count(&Actor::from(&user))?))
}

/// POST /api/notifications/{id}/read
pub async fn mark_read(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<Notification>> {
    Ok(Json(state.notifications.mark_read(&Actor::from(&user), &id)?))
}

/// POST /api/notifications/read-all
pub async fn mark_all_read(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<Json<MarkAllReadResponse>> {
    let updated = state.notifications.mark_all_read(&Actor::from(&user))?;
    Ok(Json(MarkAllReadResponse { updated }))
}
