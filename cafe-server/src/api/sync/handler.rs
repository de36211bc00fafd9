//! Sync API Handlers

use axum::{
    Json,
    extract::{Query, State},
};
use shared::message::{ChangesQuery, ChangesResponse};

use crate::auth::{CurrentUser, can_read_collection};
use crate::core::ServerState;
use crate::utils::AppResult;

const DEFAULT_LIMIT: usize = 100;
const MAX_LIMIT: usize = 1000;

/// GET /api/sync/changes?since=42&limit=100
///
/// 返回 `sequence > since` 的变更，按序列号升序，只含调用者有权查看的集合
pub async fn changes(
    State(state): State<ServerState>,
    user: CurrentUser,
    Query(query): Query<ChangesQuery>,
) -> AppResult<Json<ChangesResponse>> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);

    // 读取当前序列号在前，保证本批变更不会超过它
    let server_sequence = state.store.current_sequence()?;
    let mut changes = state.store.changes_since(query.since, limit)?;
    changes.retain(|c| c.sequence <= server_sequence);
    // 序列号连续，最后一条未到当前序列号即还有剩余
    let has_more = changes.last().is_some_and(|c| c.sequence < server_sequence);
    let next_since = changes.last().map_or(query.since, |c| c.sequence);
    changes.retain(|c| can_read_collection(&user, c.collection));

    Ok(Json(ChangesResponse {
        changes,
        server_sequence,
        next_since,
        has_more,
    }))
}
