use chrono::NaiveDateTime;

use crate::domain::StatCounters;
use crate::rating::Outcome;

pub type UserId = i64;
pub type MatchId = i64;
pub type TournamentId = i64;

pub const DELETED_PLAYER_NAME: &str = "Deleted Player";
pub const UNKNOWN_PLAYER_NAME: &str = "Unknown Player";

#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_deleted: bool,
    pub counters: StatCounters,
    pub elo_rating: i32,
    pub tournaments_played: i32,
    pub last_5_teams: Vec<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub deleted_at: Option<NaiveDateTime>,
}

impl User {
    /// Name shown next to match results
    pub fn display_name(&self) -> &str {
        if self.is_deleted {
            DELETED_PLAYER_NAME
        } else {
            &self.username
        }
    }

    pub fn full_name(&self) -> Option<String> {
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => Some(format!("{} {}", first, last)),
            (Some(first), None) => Some(first.clone()),
            (None, Some(last)) => Some(last.clone()),
            (None, None) => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub elo_rating: i32,
}

#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub username: Option<String>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl UserChanges {
    pub fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.email.is_none()
            && self.first_name.is_none()
            && self.last_name.is_none()
    }
}

/// Stats columns written back after a match is applied or reverted
#[derive(Debug, Clone)]
pub struct PlayerStanding {
    pub counters: StatCounters,
    pub elo_rating: i32,
    pub last_5_teams: Vec<String>,
}

impl From<&User> for PlayerStanding {
    fn from(user: &User) -> Self {
        Self {
            counters: user.counters,
            elo_rating: user.elo_rating,
            last_5_teams: user.last_5_teams.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FriendshipStatus {
    Pending,
    Accepted,
}

impl FriendshipStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FriendshipStatus::Pending => "pending",
            FriendshipStatus::Accepted => "accepted",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "pending" => Some(FriendshipStatus::Pending),
            "accepted" => Some(FriendshipStatus::Accepted),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Friendship {
    pub requester_id: UserId,
    pub addressee_id: UserId,
    pub status: FriendshipStatus,
    pub created_at: NaiveDateTime,
}

impl Friendship {
    pub fn other(&self, user_id: UserId) -> UserId {
        if self.requester_id == user_id {
            self.addressee_id
        } else {
            self.requester_id
        }
    }
}

#[derive(Debug, Clone)]
pub struct Tournament {
    pub id: TournamentId,
    pub name: String,
    pub description: Option<String>,
    pub start_date: NaiveDateTime,
    pub end_date: Option<NaiveDateTime>,
    pub completed: bool,
    pub owner_id: UserId,
    pub rounds_per_matchup: i32,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone)]
pub struct NewTournament {
    pub name: String,
    pub description: Option<String>,
    pub start_date: NaiveDateTime,
    pub owner_id: UserId,
    pub rounds_per_matchup: i32,
}

#[derive(Debug, Clone, Default)]
pub struct TournamentChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<NaiveDateTime>,
    pub end_date: Option<NaiveDateTime>,
    pub rounds_per_matchup: Option<i32>,
}

impl TournamentChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.start_date.is_none()
            && self.end_date.is_none()
            && self.rounds_per_matchup.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct Match {
    pub id: MatchId,
    pub player1_id: UserId,
    pub player2_id: UserId,
    pub player1_goals: i32,
    pub player2_goals: i32,
    pub team1: String,
    pub team2: String,
    pub half_length: i32,
    pub completed: bool,
    pub tournament_id: Option<TournamentId>,
    pub date: NaiveDateTime,
    /// Whether the result currently counts towards player stats and ratings
    pub applied: bool,
    pub player1_elo_change: i32,
    pub player2_elo_change: i32,
}

impl Match {
    pub fn involves(&self, user_id: UserId) -> bool {
        self.player1_id == user_id || self.player2_id == user_id
    }

    /// (own goals, opponent goals, opponent id) as seen by `user_id`
    pub fn perspective(&self, user_id: UserId) -> (i32, i32, UserId) {
        if self.player1_id == user_id {
            (self.player1_goals, self.player2_goals, self.player2_id)
        } else {
            (self.player2_goals, self.player1_goals, self.player1_id)
        }
    }

    pub fn outcome_for(&self, user_id: UserId) -> Outcome {
        let (own, opponent, _) = self.perspective(user_id);
        Outcome::from_goals(own, opponent)
    }

    pub fn team_for(&self, user_id: UserId) -> &str {
        if self.player1_id == user_id {
            &self.team1
        } else {
            &self.team2
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewMatch {
    pub player1_id: UserId,
    pub player2_id: UserId,
    pub player1_goals: i32,
    pub player2_goals: i32,
    pub team1: String,
    pub team2: String,
    pub half_length: i32,
    pub completed: bool,
    pub tournament_id: Option<TournamentId>,
    pub date: NaiveDateTime,
}

/// Result columns of a match that change on edit or replay
#[derive(Debug, Clone)]
pub struct MatchResult {
    pub player1_goals: i32,
    pub player2_goals: i32,
    pub team1: String,
    pub team2: String,
    pub half_length: i32,
    pub completed: bool,
    pub applied: bool,
    pub player1_elo_change: i32,
    pub player2_elo_change: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_match() -> Match {
        Match {
            id: 1,
            player1_id: 10,
            player2_id: 20,
            player1_goals: 1,
            player2_goals: 3,
            team1: "Arsenal".to_string(),
            team2: "Napoli".to_string(),
            half_length: 4,
            completed: true,
            tournament_id: None,
            date: NaiveDateTime::default(),
            applied: true,
            player1_elo_change: -16,
            player2_elo_change: 16,
        }
    }

    #[test]
    fn test_perspective_flips_for_second_player() {
        let m = sample_match();
        assert_eq!(m.perspective(10), (1, 3, 20));
        assert_eq!(m.perspective(20), (3, 1, 10));
        assert_eq!(m.outcome_for(10), Outcome::Loss);
        assert_eq!(m.outcome_for(20), Outcome::Win);
        assert_eq!(m.team_for(20), "Napoli");
    }

    #[test]
    fn test_friendship_status_round_trip() {
        for status in [FriendshipStatus::Pending, FriendshipStatus::Accepted] {
            assert_eq!(FriendshipStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(FriendshipStatus::parse("blocked"), None);
    }
}
