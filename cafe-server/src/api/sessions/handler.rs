//! Customer Sessions API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use chrono::Utc;
use shared::models::CustomerSession;

use crate::core::ServerState;
use crate::utils::AppResult;

/// GET /api/sessions - 近 24 小时内活跃的顾客
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<CustomerSession>>> {
    Ok(Json(state.sessions.list(Utc::now())?))
}

/// GET /api/sessions/{customer_id}
pub async fn get(
    State(state): State<ServerState>,
    Path(customer_id): Path<String>,
) -> AppResult<Json<CustomerSession>> {
    Ok(Json(state.sessions.get(&customer_id)?))
}
