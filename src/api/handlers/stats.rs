use axum::extract::{Path, Query, State};
use std::sync::Arc;

use super::{respond, AppState, CurrentUser, HandlerResult};
use crate::api::models::{LeaderboardEntry, UserStats};
use crate::database::models::UserId;
use crate::domain::HeadToHead;
use crate::pagination::{Page, PageParams};
use crate::services::StatsService;

pub async fn current_user_stats(
    State(state): State<Arc<AppState>>,
    CurrentUser(caller): CurrentUser,
) -> HandlerResult<UserStats> {
    let stats = StatsService::new(&state.pool, &state.config).current_user(caller)?;
    respond(stats, "User statistics retrieved successfully")
}

pub async fn head_to_head(
    State(state): State<Arc<AppState>>,
    Path((player1_id, player2_id)): Path<(UserId, UserId)>,
) -> HandlerResult<HeadToHead> {
    let stats = StatsService::new(&state.pool, &state.config).head_to_head(player1_id, player2_id)?;
    respond(stats, "Head-to-head statistics retrieved successfully")
}

pub async fn leaderboard(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PageParams>,
) -> HandlerResult<Page<LeaderboardEntry>> {
    let page = StatsService::new(&state.pool, &state.config).leaderboard(&params)?;
    respond(page, "Leaderboard retrieved successfully")
}
