//! Feedback API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use shared::models::{
    Feedback, FeedbackCreate, FeedbackRespond, FeedbackStats, FeedbackStatusUpdate,
};
use validator::Validate;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::domain::Actor;
use crate::utils::AppResult;

/// POST /api/feedback - 每个订单只能评价一次
pub async fn submit(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<FeedbackCreate>,
) -> AppResult<Json<Feedback>> {
    payload.validate()?;
    Ok(Json(state.feedback.submit(&Actor::from(&user), payload)?))
}

/// GET /api/feedback
pub async fn list(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<Json<Vec<Feedback>>> {
    Ok(Json(state.feedback.list(&Actor::from(&user))?))
}

/// GET /api/feedback/stats - 仅统计已发布评价
pub async fn stats(State(state): State<ServerState>) -> AppResult<Json<FeedbackStats>> {
    Ok(Json(state.feedback.stats()?))
}

/// POST /api/feedback/{id}/respond
pub async fn respond(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<FeedbackRespond>,
) -> AppResult<Json<Feedback>> {
    payload.validate()?;
    Ok(Json(state.feedback.respond(&id, &payload.response)?))
}

/// PUT /api/feedback/{id}/status
pub async fn set_status(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<FeedbackStatusUpdate>,
) -> AppResult<Json<Feedback>> {
    Ok(Json(state.feedback.set_status(&id, payload.status)?))
}

/// DELETE /api/feedback/{id}
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<Feedback>> {
    Ok(Json(state.feedback.delete(&id)?))
}
