use std::cmp::Reverse;

use serde::Serialize;

use super::counters::StatCounters;
use super::form::recent_form;
use crate::database::models::{Match, User, UserId};

#[derive(Debug, Clone, Serialize)]
pub struct StandingRow {
    pub user_id: UserId,
    pub username: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    #[serde(flatten)]
    pub counters: StatCounters,
    pub last_5_matches: Vec<String>,
}

/// Tournament table over completed matches, ordered by points, goal difference, goals scored.
/// `matches` must be ordered newest first.
pub fn compute_standings(players: &[User], matches: &[Match]) -> Vec<StandingRow> {
    let completed: Vec<&Match> = matches.iter().filter(|m| m.completed).collect();

    let mut rows: Vec<StandingRow> = players
        .iter()
        .map(|player| {
            let mut counters = StatCounters::default();
            for m in completed.iter().filter(|m| m.involves(player.id)) {
                let (own, opponent, _) = m.perspective(player.id);
                counters.record(own, opponent);
            }

            StandingRow {
                user_id: player.id,
                username: player.display_name().to_string(),
                first_name: player.first_name.clone(),
                last_name: player.last_name.clone(),
                counters,
                last_5_matches: recent_form(matches, player.id),
            }
        })
        .collect();

    rows.sort_by_key(|row| {
        Reverse((
            row.counters.points,
            row.counters.goal_difference,
            row.counters.total_goals_scored,
        ))
    });
    rows
}
