//! Member API endpoints.

use axum::{
    extract::{Path, Query, State},
    Json,
};

use super::{success, ApiResult};
use crate::errors::AppError;
use crate::models::{Member, MemberChanges, MemberFilter, MemberStatistics};
use crate::AppState;

/// GET /api/members - List members matching the query filter.
pub async fn list_members(
    State(state): State<AppState>,
    Query(filter): Query<MemberFilter>,
) -> ApiResult<Vec<Member>> {
    success(state.repo.list_members(&filter).await?)
}

/// GET /api/members/{id} - Get a single member.
pub async fn get_member(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Member> {
    match state.repo.get_member(id).await? {
        Some(member) => success(member),
        None => Err(AppError::member_not_found(id)),
    }
}

/// POST /api/members - Register a new member.
pub async fn create_member(
    State(state): State<AppState>,
    Json(changes): Json<MemberChanges>,
) -> ApiResult<Member> {
    let member = state.repo.create_member(&changes).await?;
    tracing::info!("Registered member {}", member.member_id);
    success(member)
}

/// PUT /api/members/{id} - Partial update. `null` clears a field.
pub async fn update_member(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(changes): Json<MemberChanges>,
) -> ApiResult<Member> {
    success(state.repo.update_member(id, &changes).await?)
}

/// GET /api/members/statistics - Counts by status and rank.
pub async fn member_statistics(State(state): State<AppState>) -> ApiResult<MemberStatistics> {
    success(state.repo.member_statistics().await?)
}
