use std::collections::HashMap;
use std::fmt;

use colored::Colorize;
use log::{debug, info};
use rusqlite::TransactionBehavior;

use crate::config::settings::AppConfig;
use crate::database::models::{PlayerStanding, User, UserId};
use crate::database::{self, matches, users, DbPool};
use crate::domain::{push_recent_team, StatCounters};
use crate::errors::{not_found, ServiceResult};
use crate::rating::EloCalculator;

/// Stored versus replayed stats of one user
#[derive(Debug, Clone)]
pub struct StandingDiff {
    pub user_id: UserId,
    pub username: String,
    pub stored: PlayerStanding,
    pub replayed: PlayerStanding,
}

impl fmt::Display for StandingDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let elo_delta = self.replayed.elo_rating - self.stored.elo_rating;
        let elo_delta = if elo_delta >= 0 {
            format!("{:+}", elo_delta).green()
        } else {
            format!("{:+}", elo_delta).red()
        };
        write!(
            f,
            "{} (#{}): ELO {} -> {} ({}), matches {} -> {}, points {} -> {}",
            self.username.bold(),
            self.user_id,
            self.stored.elo_rating,
            self.replayed.elo_rating,
            elo_delta,
            self.stored.counters.total_matches,
            self.replayed.counters.total_matches,
            self.stored.counters.points,
            self.replayed.counters.points
        )
    }
}

#[derive(Debug, Clone)]
pub struct RecalculationReport {
    pub dry_run: bool,
    pub matches_replayed: usize,
    pub matches_corrected: usize,
    pub users_checked: usize,
    pub diffs: Vec<StandingDiff>,
}

impl fmt::Display for RecalculationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mode = if self.dry_run {
            "Dry run".yellow()
        } else {
            "Recalculation".cyan()
        };
        writeln!(
            f,
            "{}: replayed {} matches, checked {} users",
            mode.bold(),
            self.matches_replayed,
            self.users_checked
        )?;

        if self.diffs.is_empty() {
            return write!(f, "{}", "All stored stats match the match history".green());
        }
        for diff in &self.diffs {
            writeln!(f, "  {}", diff)?;
        }
        if self.dry_run {
            write!(f, "{} users would change", self.diffs.len().to_string().yellow())
        } else {
            write!(
                f,
                "{} users and {} match deltas corrected",
                self.diffs.len().to_string().green(),
                self.matches_corrected.to_string().green()
            )
        }
    }
}

/// Rebuilds player stats and ELO from scratch by replaying the applied matches in order
pub struct RecalculationService<'a> {
    pool: &'a DbPool,
    calculator: EloCalculator,
    default_rating: i32,
}

impl<'a> RecalculationService<'a> {
    pub fn new(pool: &'a DbPool, config: &AppConfig) -> Self {
        Self {
            pool,
            calculator: EloCalculator::from(&config.elo),
            default_rating: config.elo.default_rating,
        }
    }

    /// With `only_user` set, only that user's stats are reported and written.
    /// Match deltas are rewritten only on a full run.
    pub fn run(&self, dry_run: bool, only_user: Option<UserId>) -> ServiceResult<RecalculationReport> {
        let mut conn = database::get_connection(self.pool)?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let all_users = users::list_all(&tx)?;
        if let Some(id) = only_user {
            if !all_users.iter().any(|u| u.id == id) {
                return Err(not_found(format!("User {} not found", id)));
            }
        }

        let mut replayed: HashMap<UserId, PlayerStanding> = all_users
            .iter()
            .map(|u| (u.id, self.fresh_standing()))
            .collect();

        let history = matches::list_applied_chronological(&tx)?;
        let mut corrections = Vec::new();
        for m in &history {
            let rating1 = replayed.get(&m.player1_id).map_or(self.default_rating, |s| s.elo_rating);
            let rating2 = replayed.get(&m.player2_id).map_or(self.default_rating, |s| s.elo_rating);
            let update = self
                .calculator
                .apply(rating1, rating2, m.player1_goals, m.player2_goals);

            for (player_id, new_rating) in [
                (m.player1_id, update.new_rating_a),
                (m.player2_id, update.new_rating_b),
            ] {
                let standing = replayed
                    .entry(player_id)
                    .or_insert_with(|| self.fresh_standing());
                let (own, opponent, _) = m.perspective(player_id);
                standing.counters.record(own, opponent);
                standing.elo_rating = new_rating;
                push_recent_team(&mut standing.last_5_teams, m.team_for(player_id));
            }

            if m.player1_elo_change != update.delta_a || m.player2_elo_change != update.delta_b {
                corrections.push((m.id, update.delta_a, update.delta_b));
            }
        }

        let diffs: Vec<StandingDiff> = all_users
            .iter()
            .filter(|u| only_user.is_none_or(|id| id == u.id))
            .filter_map(|u| {
                let after = replayed.get(&u.id)?;
                differs(u, after).then(|| StandingDiff {
                    user_id: u.id,
                    username: u.username.clone(),
                    stored: PlayerStanding::from(u),
                    replayed: after.clone(),
                })
            })
            .collect();
        let users_checked = all_users
            .iter()
            .filter(|u| only_user.is_none_or(|id| id == u.id))
            .count();

        let matches_corrected = if only_user.is_none() { corrections.len() } else { 0 };
        if !dry_run {
            let now = database::now();
            for diff in &diffs {
                users::save_standing(&tx, diff.user_id, &diff.replayed, now)?;
            }
            if only_user.is_none() {
                for &(id, delta1, delta2) in &corrections {
                    matches::save_elo_changes(&tx, id, delta1, delta2)?;
                }
            }
            tx.commit()?;
            info!(
                "Recalculated stats from {} matches: {} users and {} match deltas updated",
                history.len(),
                diffs.len(),
                matches_corrected
            );
        } else {
            debug!("Dry run, rolling back recalculation");
        }

        Ok(RecalculationReport {
            dry_run,
            matches_replayed: history.len(),
            matches_corrected,
            users_checked,
            diffs,
        })
    }

    fn fresh_standing(&self) -> PlayerStanding {
        PlayerStanding {
            counters: StatCounters::default(),
            elo_rating: self.default_rating,
            last_5_teams: Vec::new(),
        }
    }
}

fn differs(user: &User, replayed: &PlayerStanding) -> bool {
    user.counters != replayed.counters
        || user.elo_rating != replayed.elo_rating
        || user.last_5_teams != replayed.last_5_teams
}
