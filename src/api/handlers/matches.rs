use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use std::sync::Arc;

use super::{respond, AppState, CurrentUser, HandlerResult};
use crate::api::errors::ApiError;
use crate::api::models::{ApiResponse, ItemList, MatchView, RecordMatchRequest, UpdateMatchRequest};
use crate::database::models::MatchId;
use crate::services::MatchService;

pub async fn record_match(
    State(state): State<Arc<AppState>>,
    CurrentUser(caller): CurrentUser,
    Json(request): Json<RecordMatchRequest>,
) -> Result<(StatusCode, Json<ApiResponse<MatchView>>), ApiError> {
    let recorded = MatchService::new(&state.pool, &state.config).record(&request)?;
    log::debug!("Match {} recorded by user {}", recorded.id, caller);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(recorded, "Match created successfully")),
    ))
}

pub async fn list_matches(State(state): State<Arc<AppState>>) -> HandlerResult<ItemList<MatchView>> {
    let all = MatchService::new(&state.pool, &state.config).list()?;
    let message = format!("Retrieved {} matches", all.len());
    respond(all.into(), message)
}

pub async fn get_match(
    State(state): State<Arc<AppState>>,
    Path(match_id): Path<MatchId>,
) -> HandlerResult<MatchView> {
    let found = MatchService::new(&state.pool, &state.config).get(match_id)?;
    respond(found, "Match retrieved successfully")
}

pub async fn update_match(
    State(state): State<Arc<AppState>>,
    CurrentUser(_): CurrentUser,
    Path(match_id): Path<MatchId>,
    Json(request): Json<UpdateMatchRequest>,
) -> HandlerResult<MatchView> {
    let (updated, changed) = MatchService::new(&state.pool, &state.config).update(match_id, &request)?;
    let message = if changed {
        "Match updated successfully"
    } else {
        "No changes detected"
    };
    respond(updated, message)
}

pub async fn delete_match(
    State(state): State<Arc<AppState>>,
    CurrentUser(_): CurrentUser,
    Path(match_id): Path<MatchId>,
) -> HandlerResult<()> {
    MatchService::new(&state.pool, &state.config).delete(match_id)?;
    respond((), "Match deleted successfully")
}
