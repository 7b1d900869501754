use log::{debug, info};
use rusqlite::{Connection, TransactionBehavior};

use super::lookup::Lookup;
use crate::api::models::{MatchView, RecordMatchRequest, UpdateMatchRequest};
use crate::config::settings::AppConfig;
use crate::database::models::{
    Match, MatchId, MatchResult, NewMatch, PlayerStanding, User, UserId,
};
use crate::database::{self, matches, tournaments, users, DbPool};
use crate::domain::push_recent_team;
use crate::errors::{bad_request, not_found, ServiceResult};
use crate::rating::{EloCalculator, EloUpdate};

pub const MIN_HALF_LENGTH: i32 = 3;
pub const MAX_HALF_LENGTH: i32 = 6;
pub const MAX_GOALS: i32 = 99;

/// Records, edits and removes matches while keeping player stats and ratings in step
pub struct MatchService<'a> {
    pool: &'a DbPool,
    calculator: EloCalculator,
}

impl<'a> MatchService<'a> {
    pub fn new(pool: &'a DbPool, config: &AppConfig) -> Self {
        Self {
            pool,
            calculator: EloCalculator::from(&config.elo),
        }
    }

    pub fn record(&self, request: &RecordMatchRequest) -> ServiceResult<MatchView> {
        validate_score(request.player1_goals, request.player2_goals)?;
        validate_half_length(request.half_length)?;
        if request.player1_id == request.player2_id {
            return Err(bad_request("A player cannot play against themselves"));
        }

        let mut conn = database::get_connection(self.pool)?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        for player_id in [request.player1_id, request.player2_id] {
            if users::find_by_id(&tx, player_id)?.is_none() {
                return Err(not_found(format!("Player {} not found", player_id)));
            }
        }
        if let Some(tournament_id) = request.tournament_id {
            let tournament = tournaments::find_by_id(&tx, tournament_id)?
                .ok_or_else(|| not_found("Tournament not found"))?;
            if tournament.completed {
                return Err(bad_request("Cannot add matches to a completed tournament"));
            }
        }

        let inserted = matches::insert_match(
            &tx,
            &NewMatch {
                player1_id: request.player1_id,
                player2_id: request.player2_id,
                player1_goals: request.player1_goals,
                player2_goals: request.player2_goals,
                team1: request.team1.trim().to_string(),
                team2: request.team2.trim().to_string(),
                half_length: request.half_length,
                completed: request.completed,
                tournament_id: request.tournament_id,
                date: database::now(),
            },
        )?;
        let recorded = apply_to_match(&tx, &self.calculator, &inserted)?;
        let view = Lookup::new(&tx).match_view(&recorded)?;
        tx.commit()?;

        info!(
            "Recorded match {}: {} {}-{} {} (ELO {:+}/{:+})",
            recorded.id,
            view.player1_name,
            recorded.player1_goals,
            recorded.player2_goals,
            view.player2_name,
            recorded.player1_elo_change,
            recorded.player2_elo_change
        );
        Ok(view)
    }

    /// Returns the updated match and whether anything changed
    pub fn update(&self, id: MatchId, request: &UpdateMatchRequest) -> ServiceResult<(MatchView, bool)> {
        validate_score(request.player1_goals, request.player2_goals)?;
        validate_half_length(request.half_length)?;

        let mut conn = database::get_connection(self.pool)?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let existing = matches::find_by_id(&tx, id)?.ok_or_else(|| not_found("Match not found"))?;
        let team1 = request
            .team1
            .as_deref()
            .map(str::trim)
            .unwrap_or(&existing.team1)
            .to_string();
        let team2 = request
            .team2
            .as_deref()
            .map(str::trim)
            .unwrap_or(&existing.team2)
            .to_string();

        let unchanged = existing.player1_goals == request.player1_goals
            && existing.player2_goals == request.player2_goals
            && existing.team1 == team1
            && existing.team2 == team2
            && existing.half_length == request.half_length
            && existing.completed == request.completed;
        if unchanged {
            let view = Lookup::new(&tx).match_view(&existing)?;
            return Ok((view, false));
        }

        if existing.applied {
            revert_match(&tx, &existing)?;
        }
        let cleared = matches::save_result(
            &tx,
            id,
            &MatchResult {
                player1_goals: request.player1_goals,
                player2_goals: request.player2_goals,
                team1,
                team2,
                half_length: request.half_length,
                completed: request.completed,
                applied: false,
                player1_elo_change: 0,
                player2_elo_change: 0,
            },
        )?;

        let updated = if existing.applied || request.completed {
            apply_to_match(&tx, &self.calculator, &cleared)?
        } else {
            cleared
        };
        let view = Lookup::new(&tx).match_view(&updated)?;
        tx.commit()?;

        info!(
            "Updated match {}: {}-{} (ELO {:+}/{:+})",
            id,
            updated.player1_goals,
            updated.player2_goals,
            updated.player1_elo_change,
            updated.player2_elo_change
        );
        Ok((view, true))
    }

    pub fn delete(&self, id: MatchId) -> ServiceResult<()> {
        let mut conn = database::get_connection(self.pool)?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let existing = matches::find_by_id(&tx, id)?.ok_or_else(|| not_found("Match not found"))?;
        remove_match(&tx, &existing)?;
        tx.commit()?;

        info!(
            "Deleted match {} between players {} and {}",
            id, existing.player1_id, existing.player2_id
        );
        Ok(())
    }

    pub fn list(&self) -> ServiceResult<Vec<MatchView>> {
        let conn = database::get_connection(self.pool)?;
        let all = matches::list_all(&conn)?;
        debug!("Retrieved {} matches", all.len());
        Ok(Lookup::new(&conn).match_views(&all)?)
    }

    pub fn get(&self, id: MatchId) -> ServiceResult<MatchView> {
        let conn = database::get_connection(self.pool)?;
        let found = matches::find_by_id(&conn, id)?.ok_or_else(|| not_found("Match not found"))?;
        Ok(Lookup::new(&conn).match_view(&found)?)
    }

    pub fn list_for_user(&self, user_id: UserId) -> ServiceResult<Vec<MatchView>> {
        let conn = database::get_connection(self.pool)?;
        if users::find_by_id(&conn, user_id)?.is_none() {
            return Err(not_found("User not found"));
        }
        let played = matches::list_for_user(&conn, user_id, false, None)?;
        Ok(Lookup::new(&conn).match_views(&played)?)
    }
}

pub fn validate_score(player1_goals: i32, player2_goals: i32) -> ServiceResult<()> {
    if player1_goals < 0 || player2_goals < 0 {
        return Err(bad_request("Goals cannot be negative"));
    }
    if player1_goals > MAX_GOALS || player2_goals > MAX_GOALS {
        return Err(bad_request(format!("Goals cannot exceed {}", MAX_GOALS)));
    }
    Ok(())
}

pub fn validate_half_length(half_length: i32) -> ServiceResult<()> {
    if !(MIN_HALF_LENGTH..=MAX_HALF_LENGTH).contains(&half_length) {
        return Err(bad_request(format!(
            "Half length must be between {} and {} minutes",
            MIN_HALF_LENGTH, MAX_HALF_LENGTH
        )));
    }
    Ok(())
}

fn load_player(conn: &Connection, id: UserId) -> ServiceResult<User> {
    users::find_by_id(conn, id)?.ok_or_else(|| not_found(format!("Player {} not found", id)))
}

/// Counts an unapplied match towards both players and stores the ELO deltas on it
pub(crate) fn apply_to_match(
    conn: &Connection,
    calculator: &EloCalculator,
    m: &Match,
) -> ServiceResult<Match> {
    let player1 = load_player(conn, m.player1_id)?;
    let player2 = load_player(conn, m.player2_id)?;

    let update = calculator.apply(
        player1.elo_rating,
        player2.elo_rating,
        m.player1_goals,
        m.player2_goals,
    );
    let now = database::now();
    users::save_standing(conn, player1.id, &applied_standing(&player1, m, &update, true), now)?;
    users::save_standing(conn, player2.id, &applied_standing(&player2, m, &update, false), now)?;

    let saved = matches::save_result(
        conn,
        m.id,
        &MatchResult {
            player1_goals: m.player1_goals,
            player2_goals: m.player2_goals,
            team1: m.team1.clone(),
            team2: m.team2.clone(),
            half_length: m.half_length,
            completed: m.completed,
            applied: true,
            player1_elo_change: update.delta_a,
            player2_elo_change: update.delta_b,
        },
    )?;
    Ok(saved)
}

fn applied_standing(player: &User, m: &Match, update: &EloUpdate, is_player1: bool) -> PlayerStanding {
    let mut standing = PlayerStanding::from(player);
    let (own, opponent, _) = m.perspective(player.id);
    standing.counters.record(own, opponent);
    standing.elo_rating = if is_player1 {
        update.new_rating_a
    } else {
        update.new_rating_b
    };
    push_recent_team(&mut standing.last_5_teams, m.team_for(player.id));
    standing
}

/// Takes an applied match back out of both players' stats and ratings
pub(crate) fn revert_match(conn: &Connection, m: &Match) -> ServiceResult<()> {
    let now = database::now();
    for (player_id, elo_change) in [
        (m.player1_id, m.player1_elo_change),
        (m.player2_id, m.player2_elo_change),
    ] {
        let player = load_player(conn, player_id)?;
        let mut standing = PlayerStanding::from(&player);
        let (own, opponent, _) = m.perspective(player_id);
        standing.counters.revert(own, opponent);
        standing.elo_rating -= elo_change;
        users::save_standing(conn, player_id, &standing, now)?;
    }

    debug!(
        "Reverted match {} (ELO {:+}/{:+})",
        m.id, m.player1_elo_change, m.player2_elo_change
    );
    Ok(())
}

/// Deletes a match, reverting it first when it counts towards stats
pub(crate) fn remove_match(conn: &Connection, m: &Match) -> ServiceResult<()> {
    if m.applied {
        revert_match(conn, m)?;
    }
    matches::delete_match(conn, m.id)?;
    Ok(())
}
