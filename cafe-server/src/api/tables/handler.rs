//! Dining Table API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::Utc;
use serde::Deserialize;
use shared::models::{
    CustomerPriority, DiningTable, DiningTableCreate, TableAssignment, TableHistoryEntry,
    TableSuggestion,
};
use validator::Validate;

use crate::core::ServerState;
use crate::utils::AppResult;

#[derive(Debug, Deserialize)]
pub struct SuggestQuery {
    pub guests: u32,
    /// 指定顾客时按到店次数判断 VIP
    pub customer_id: Option<String>,
}

/// GET /api/tables
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<DiningTable>>> {
    Ok(Json(state.tables.list()?))
}

/// GET /api/tables/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<DiningTable>> {
    Ok(Json(state.tables.get(&id)?))
}

/// POST /api/tables
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<DiningTableCreate>,
) -> AppResult<Json<DiningTable>> {
    payload.validate()?;
    Ok(Json(state.tables.create(payload)?))
}

/// GET /api/tables/assignments - 每张桌台的当前预订
pub async fn assignments(
    State(state): State<ServerState>,
) -> AppResult<Json<Vec<TableAssignment>>> {
    Ok(Json(state.tables.assignments()?))
}

/// GET /api/tables/{id}/history - 使用记录，最新的在前
pub async fn history(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<Vec<TableHistoryEntry>>> {
    Ok(Json(state.tables.history(&id)?))
}

/// GET /api/tables/priority-queue - 待审批预订排名 (仅展示)
pub async fn priority_queue(
    State(state): State<ServerState>,
) -> AppResult<Json<Vec<CustomerPriority>>> {
    Ok(Json(state.tables.priority_queue(Utc::now())?))
}

/// GET /api/tables/suggest?guests=4&customer_id=...
pub async fn suggest(
    State(state): State<ServerState>,
    Query(query): Query<SuggestQuery>,
) -> AppResult<Json<Option<TableSuggestion>>> {
    let suggestion = state
        .tables
        .suggest(query.guests, query.customer_id.as_deref())?;
    Ok(Json(suggestion))
}
