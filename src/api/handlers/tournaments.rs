use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use std::sync::Arc;

use super::{respond, AppState, CurrentUser, HandlerResult};
use crate::api::errors::ApiError;
use crate::api::models::{
    AddPlayerRequest, ApiResponse, CreateTournamentRequest, FriendView, ItemList, MatchView,
    TournamentView, UpdateTournamentRequest,
};
use crate::database::models::{TournamentId, UserId};
use crate::domain::StandingRow;
use crate::pagination::{Page, PageParams};
use crate::services::TournamentService;

pub async fn create_tournament(
    State(state): State<Arc<AppState>>,
    CurrentUser(caller): CurrentUser,
    Json(request): Json<CreateTournamentRequest>,
) -> Result<(StatusCode, Json<ApiResponse<TournamentView>>), ApiError> {
    let created = TournamentService::new(&state.pool, &state.config).create(caller, &request)?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(created, "Tournament created successfully")),
    ))
}

pub async fn list_tournaments(
    State(state): State<Arc<AppState>>,
    CurrentUser(caller): CurrentUser,
) -> HandlerResult<ItemList<TournamentView>> {
    let found = TournamentService::new(&state.pool, &state.config).list_for_user(caller)?;
    let message = format!("Retrieved {} tournaments", found.len());
    respond(found.into(), message)
}

pub async fn get_tournament(
    State(state): State<Arc<AppState>>,
    Path(id): Path<TournamentId>,
) -> HandlerResult<TournamentView> {
    let found = TournamentService::new(&state.pool, &state.config).get(id)?;
    respond(found, "Tournament retrieved successfully")
}

pub async fn update_tournament(
    State(state): State<Arc<AppState>>,
    CurrentUser(_): CurrentUser,
    Path(id): Path<TournamentId>,
    Json(request): Json<UpdateTournamentRequest>,
) -> HandlerResult<TournamentView> {
    let updated = TournamentService::new(&state.pool, &state.config).update(id, &request)?;
    respond(updated, "Tournament updated successfully")
}

pub async fn delete_tournament(
    State(state): State<Arc<AppState>>,
    CurrentUser(caller): CurrentUser,
    Path(id): Path<TournamentId>,
) -> HandlerResult<()> {
    TournamentService::new(&state.pool, &state.config).delete(caller, id)?;
    respond((), "Tournament deleted successfully")
}

pub async fn list_players(
    State(state): State<Arc<AppState>>,
    Path(id): Path<TournamentId>,
) -> HandlerResult<ItemList<FriendView>> {
    let players = TournamentService::new(&state.pool, &state.config).players(id)?;
    let message = format!("Retrieved {} players", players.len());
    respond(players.into(), message)
}

pub async fn add_player(
    State(state): State<Arc<AppState>>,
    CurrentUser(_): CurrentUser,
    Path(id): Path<TournamentId>,
    Json(request): Json<AddPlayerRequest>,
) -> HandlerResult<TournamentView> {
    let updated = TournamentService::new(&state.pool, &state.config).add_player(id, request.player_id)?;
    respond(updated, "Player added to tournament successfully")
}

pub async fn remove_player(
    State(state): State<Arc<AppState>>,
    CurrentUser(_): CurrentUser,
    Path((id, player_id)): Path<(TournamentId, UserId)>,
) -> HandlerResult<TournamentView> {
    let updated = TournamentService::new(&state.pool, &state.config).remove_player(id, player_id)?;
    respond(updated, "Player removed from tournament successfully")
}

pub async fn list_matches(
    State(state): State<Arc<AppState>>,
    Path(id): Path<TournamentId>,
    Query(params): Query<PageParams>,
) -> HandlerResult<Page<MatchView>> {
    let page = TournamentService::new(&state.pool, &state.config).matches(id, &params)?;
    let message = format!("Retrieved {} of {} tournament matches", page.items.len(), page.total);
    respond(page, message)
}

pub async fn standings(
    State(state): State<Arc<AppState>>,
    Path(id): Path<TournamentId>,
) -> HandlerResult<ItemList<StandingRow>> {
    let table = TournamentService::new(&state.pool, &state.config).standings(id)?;
    respond(table.into(), "Tournament standings retrieved successfully")
}

pub async fn end_tournament(
    State(state): State<Arc<AppState>>,
    CurrentUser(caller): CurrentUser,
    Path(id): Path<TournamentId>,
) -> HandlerResult<TournamentView> {
    let ended = TournamentService::new(&state.pool, &state.config).end(caller, id)?;
    respond(ended, "Tournament ended successfully")
}
