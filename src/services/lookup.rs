use std::collections::HashMap;

use anyhow::Result;
use rusqlite::Connection;

use crate::api::models::{MatchView, RecentMatch};
use crate::database::models::{Match, TournamentId, User, UserId, UNKNOWN_PLAYER_NAME};
use crate::database::{tournaments, users};

/// Memoised user and tournament lookups used while rendering match listings
pub struct Lookup<'c> {
    conn: &'c Connection,
    users: HashMap<UserId, Option<User>>,
    tournament_names: HashMap<TournamentId, Option<String>>,
}

impl<'c> Lookup<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self {
            conn,
            users: HashMap::new(),
            tournament_names: HashMap::new(),
        }
    }

    pub fn user(&mut self, id: UserId) -> Result<Option<&User>> {
        if !self.users.contains_key(&id) {
            let user = users::find_by_id(self.conn, id)?;
            self.users.insert(id, user);
        }
        Ok(self.users.get(&id).and_then(Option::as_ref))
    }

    /// "Deleted Player" for soft-deleted users, "Unknown Player" when the row is gone
    pub fn player_name(&mut self, id: UserId) -> Result<String> {
        Ok(self
            .user(id)?
            .map(|user| user.display_name().to_string())
            .unwrap_or_else(|| UNKNOWN_PLAYER_NAME.to_string()))
    }

    pub fn tournament_name(&mut self, id: Option<TournamentId>) -> Result<Option<String>> {
        let Some(id) = id else {
            return Ok(None);
        };
        if !self.tournament_names.contains_key(&id) {
            let name = tournaments::find_by_id(self.conn, id)?.map(|t| t.name);
            self.tournament_names.insert(id, name);
        }
        Ok(self.tournament_names.get(&id).cloned().flatten())
    }

    pub fn tournament_names(&mut self, matches: &[Match]) -> Result<HashMap<TournamentId, String>> {
        let mut names = HashMap::new();
        for id in matches.iter().filter_map(|m| m.tournament_id) {
            if let Some(name) = self.tournament_name(Some(id))? {
                names.insert(id, name);
            }
        }
        Ok(names)
    }

    pub fn match_view(&mut self, m: &Match) -> Result<MatchView> {
        let player1_name = self.player_name(m.player1_id)?;
        let player2_name = self.player_name(m.player2_id)?;
        let tournament_name = self.tournament_name(m.tournament_id)?;
        Ok(MatchView::new(m, player1_name, player2_name, tournament_name))
    }

    pub fn match_views(&mut self, matches: &[Match]) -> Result<Vec<MatchView>> {
        matches.iter().map(|m| self.match_view(m)).collect()
    }

    pub fn recent_match(&mut self, m: &Match, user_id: UserId) -> Result<RecentMatch> {
        let (own, opponent, opponent_id) = m.perspective(user_id);
        let opponent_username = self
            .user(opponent_id)?
            .map(|user| user.display_name().to_string());

        Ok(RecentMatch {
            match_id: m.id,
            date: m.date,
            player1_goals: m.player1_goals,
            player2_goals: m.player2_goals,
            team1: m.team1.clone(),
            team2: m.team2.clone(),
            tournament_name: self.tournament_name(m.tournament_id)?,
            opponent_id,
            opponent_username,
            current_player_goals: own,
            opponent_goals: opponent,
            match_result: m.outcome_for(user_id),
        })
    }
}
