use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use std::sync::Arc;

use super::{respond, AppState, CurrentUser, HandlerResult};
use crate::api::errors::ApiError;
use crate::api::models::{
    ApiResponse, DetailedUserStats, ItemList, MatchView, RegisterUserRequest, SearchParams,
    UpdateUserRequest, UserSearchResult, UserView,
};
use crate::database::models::UserId;
use crate::errors::forbidden;
use crate::services::{MatchService, StatsService, UserService};

pub async fn register_user(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RegisterUserRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UserView>>), ApiError> {
    let user = UserService::new(&state.pool, &state.config).register(&request)?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(user, "User registered successfully")),
    ))
}

pub async fn list_users(State(state): State<Arc<AppState>>) -> HandlerResult<ItemList<UserView>> {
    let users = UserService::new(&state.pool, &state.config).list()?;
    let message = format!("Retrieved {} users", users.len());
    respond(users.into(), message)
}

pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<UserId>,
) -> HandlerResult<UserView> {
    let user = UserService::new(&state.pool, &state.config).get(user_id)?;
    respond(user, "User retrieved successfully")
}

pub async fn update_user(
    State(state): State<Arc<AppState>>,
    CurrentUser(caller): CurrentUser,
    Path(user_id): Path<UserId>,
    Json(request): Json<UpdateUserRequest>,
) -> HandlerResult<UserView> {
    if caller != user_id {
        return Err(forbidden("You can only update your own profile").into());
    }
    let user = UserService::new(&state.pool, &state.config).update(user_id, &request)?;
    respond(user, "User updated successfully")
}

pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    CurrentUser(caller): CurrentUser,
    Path(user_id): Path<UserId>,
) -> HandlerResult<()> {
    if caller != user_id {
        return Err(forbidden("You can only delete your own account").into());
    }
    UserService::new(&state.pool, &state.config).delete(user_id)?;
    respond((), "User marked as deleted successfully")
}

pub async fn search_users(
    State(state): State<Arc<AppState>>,
    CurrentUser(caller): CurrentUser,
    Query(params): Query<SearchParams>,
) -> HandlerResult<ItemList<UserSearchResult>> {
    let found = UserService::new(&state.pool, &state.config).search(caller, &params.q, params.limit)?;
    let message = format!("Found {} users", found.len());
    respond(found.into(), message)
}

pub async fn get_user_matches(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<UserId>,
) -> HandlerResult<ItemList<MatchView>> {
    let played = MatchService::new(&state.pool, &state.config).list_for_user(user_id)?;
    let message = format!("Retrieved {} matches for user", played.len());
    respond(played.into(), message)
}

pub async fn get_user_stats(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<UserId>,
) -> HandlerResult<DetailedUserStats> {
    let stats = StatsService::new(&state.pool, &state.config).detailed(user_id)?;
    respond(stats, "User detailed statistics retrieved successfully")
}
