use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::database::models::{
    Match, MatchId, Tournament, TournamentId, User, UserId,
};
use crate::domain::{DetailedStats, StatCounters};
use crate::rating::Outcome;

fn default_half_length() -> i32 {
    4
}

fn default_completed() -> bool {
    true
}

// --- Envelope ---

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: String,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: message.into(),
        }
    }
}

impl ApiResponse<()> {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ItemList<T> {
    pub items: Vec<T>,
}

impl<T> From<Vec<T>> for ItemList<T> {
    fn from(items: Vec<T>) -> Self {
        Self { items }
    }
}

// --- Requests ---

#[derive(Debug, Deserialize)]
pub struct RegisterUserRequest {
    pub username: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: String,
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct FriendRequestBody {
    pub user_id: UserId,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecordMatchRequest {
    pub player1_id: UserId,
    pub player2_id: UserId,
    pub player1_goals: i32,
    pub player2_goals: i32,
    #[serde(default)]
    pub team1: String,
    #[serde(default)]
    pub team2: String,
    #[serde(default = "default_half_length")]
    pub half_length: i32,
    pub tournament_id: Option<TournamentId>,
    #[serde(default = "default_completed")]
    pub completed: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateMatchRequest {
    pub player1_goals: i32,
    pub player2_goals: i32,
    pub team1: Option<String>,
    pub team2: Option<String>,
    #[serde(default = "default_half_length")]
    pub half_length: i32,
    #[serde(default = "default_completed")]
    pub completed: bool,
}

#[derive(Debug, Deserialize)]
pub struct CreateTournamentRequest {
    pub name: String,
    pub description: Option<String>,
    pub start_date: Option<NaiveDateTime>,
    #[serde(default)]
    pub player_ids: Vec<UserId>,
    pub rounds_per_matchup: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateTournamentRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<NaiveDateTime>,
    pub end_date: Option<NaiveDateTime>,
    pub rounds_per_matchup: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct AddPlayerRequest {
    pub player_id: UserId,
}

// --- Responses ---

#[derive(Debug, Clone, Serialize)]
pub struct UserView {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub full_name: Option<String>,
    pub is_deleted: bool,
    #[serde(flatten)]
    pub counters: StatCounters,
    pub elo_rating: i32,
    pub tournaments_played: i32,
    pub last_5_teams: Vec<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            full_name: user.full_name(),
            is_deleted: user.is_deleted,
            counters: user.counters,
            elo_rating: user.elo_rating,
            tournaments_played: user.tournaments_played,
            last_5_teams: user.last_5_teams.clone(),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UserSearchResult {
    pub id: UserId,
    pub username: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub full_name: Option<String>,
    pub elo_rating: i32,
    pub is_friend: bool,
    pub friend_request_sent: bool,
    pub friend_request_received: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct FriendView {
    pub id: UserId,
    pub username: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub elo_rating: i32,
}

impl From<&User> for FriendView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.display_name().to_string(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            elo_rating: user.elo_rating,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FriendRequests {
    pub sent: Vec<FriendView>,
    pub received: Vec<FriendView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecentOpponent {
    pub id: UserId,
    pub username: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub friend_request_sent: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchView {
    pub id: MatchId,
    pub player1_id: UserId,
    pub player2_id: UserId,
    pub player1_name: String,
    pub player2_name: String,
    pub player1_goals: i32,
    pub player2_goals: i32,
    pub team1: String,
    pub team2: String,
    pub half_length: i32,
    pub completed: bool,
    pub applied: bool,
    pub tournament_id: Option<TournamentId>,
    pub tournament_name: Option<String>,
    pub date: NaiveDateTime,
    pub player1_elo_change: i32,
    pub player2_elo_change: i32,
}

impl MatchView {
    pub fn new(
        m: &Match,
        player1_name: String,
        player2_name: String,
        tournament_name: Option<String>,
    ) -> Self {
        Self {
            id: m.id,
            player1_id: m.player1_id,
            player2_id: m.player2_id,
            player1_name,
            player2_name,
            player1_goals: m.player1_goals,
            player2_goals: m.player2_goals,
            team1: m.team1.clone(),
            team2: m.team2.clone(),
            half_length: m.half_length,
            completed: m.completed,
            applied: m.applied,
            tournament_id: m.tournament_id,
            tournament_name,
            date: m.date,
            player1_elo_change: m.player1_elo_change,
            player2_elo_change: m.player2_elo_change,
        }
    }
}

/// A match seen from one player's side
#[derive(Debug, Clone, Serialize)]
pub struct RecentMatch {
    pub match_id: MatchId,
    pub date: NaiveDateTime,
    pub player1_goals: i32,
    pub player2_goals: i32,
    pub team1: String,
    pub team2: String,
    pub tournament_name: Option<String>,
    pub opponent_id: UserId,
    pub opponent_username: Option<String>,
    pub current_player_goals: i32,
    pub opponent_goals: i32,
    pub match_result: Outcome,
}

#[derive(Debug, Clone, Serialize)]
pub struct TournamentView {
    pub id: TournamentId,
    pub name: String,
    pub description: Option<String>,
    pub start_date: NaiveDateTime,
    pub end_date: Option<NaiveDateTime>,
    pub completed: bool,
    pub owner_id: UserId,
    pub rounds_per_matchup: i32,
    pub player_ids: Vec<UserId>,
    pub matches_count: usize,
    pub created_at: NaiveDateTime,
}

impl TournamentView {
    pub fn new(tournament: &Tournament, player_ids: Vec<UserId>, matches_count: usize) -> Self {
        Self {
            id: tournament.id,
            name: tournament.name.clone(),
            description: tournament.description.clone(),
            start_date: tournament.start_date,
            end_date: tournament.end_date,
            completed: tournament.completed,
            owner_id: tournament.owner_id,
            rounds_per_matchup: tournament.rounds_per_matchup,
            player_ids,
            matches_count,
            created_at: tournament.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UserStats {
    #[serde(flatten)]
    pub user: UserView,
    pub last_5_matches: Vec<RecentMatch>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DetailedUserStats {
    #[serde(flatten)]
    pub user: UserView,
    #[serde(flatten)]
    pub stats: DetailedStats,
    pub tournament_ids: Vec<TournamentId>,
    pub last_5_matches: Vec<RecentMatch>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub id: UserId,
    pub username: String,
    pub elo_rating: i32,
    #[serde(flatten)]
    pub counters: StatCounters,
    pub tournaments_played: i32,
}

impl LeaderboardEntry {
    pub fn new(rank: usize, user: &User) -> Self {
        Self {
            rank,
            id: user.id,
            username: user.display_name().to_string(),
            elo_rating: user.elo_rating,
            counters: user.counters,
            tournaments_played: user.tournaments_played,
        }
    }
}
