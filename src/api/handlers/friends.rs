use axum::extract::{Path, State};
use axum::response::Json;
use std::sync::Arc;

use super::{respond, AppState, CurrentUser, HandlerResult};
use crate::api::models::{FriendRequestBody, FriendRequests, FriendView, ItemList, RecentOpponent};
use crate::database::models::UserId;
use crate::services::FriendService;

pub async fn list_friends(
    State(state): State<Arc<AppState>>,
    CurrentUser(caller): CurrentUser,
) -> HandlerResult<ItemList<FriendView>> {
    let friends = FriendService::new(&state.pool).list_friends(caller)?;
    let message = format!("Retrieved {} friends", friends.len());
    respond(friends.into(), message)
}

pub async fn list_requests(
    State(state): State<Arc<AppState>>,
    CurrentUser(caller): CurrentUser,
) -> HandlerResult<FriendRequests> {
    let requests = FriendService::new(&state.pool).list_requests(caller)?;
    respond(requests, "Friend requests retrieved successfully")
}

pub async fn send_request(
    State(state): State<Arc<AppState>>,
    CurrentUser(caller): CurrentUser,
    Json(body): Json<FriendRequestBody>,
) -> HandlerResult<()> {
    FriendService::new(&state.pool).send_request(caller, body.user_id)?;
    respond((), "Friend request sent successfully")
}

pub async fn accept_request(
    State(state): State<Arc<AppState>>,
    CurrentUser(caller): CurrentUser,
    Path(from): Path<UserId>,
) -> HandlerResult<()> {
    FriendService::new(&state.pool).accept_request(caller, from)?;
    respond((), "Friend request accepted")
}

pub async fn reject_request(
    State(state): State<Arc<AppState>>,
    CurrentUser(caller): CurrentUser,
    Path(from): Path<UserId>,
) -> HandlerResult<()> {
    FriendService::new(&state.pool).reject_request(caller, from)?;
    respond((), "Friend request rejected")
}

pub async fn remove_friend(
    State(state): State<Arc<AppState>>,
    CurrentUser(caller): CurrentUser,
    Path(friend_id): Path<UserId>,
) -> HandlerResult<()> {
    FriendService::new(&state.pool).remove_friend(caller, friend_id)?;
    respond((), "Friend removed successfully")
}

pub async fn recent_opponents(
    State(state): State<Arc<AppState>>,
    CurrentUser(caller): CurrentUser,
) -> HandlerResult<ItemList<RecentOpponent>> {
    let opponents = FriendService::new(&state.pool).recent_opponents(caller)?;
    let message = format!("Found {} recent opponents", opponents.len());
    respond(opponents.into(), message)
}
